//! Schema inference over a set of records
//!
//! Every field is nullable. Fields are ordered by first appearance, so the
//! same input always yields the same column order.

use super::types::{FieldType, MergeConflict, StructField};
use crate::error::{Error, Result};
use crate::types::Record;
use arrow::datatypes::{Field, Schema};
use std::collections::HashMap;

/// Inferred schema of one partition of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSchema {
    fields: Vec<StructField>,
}

impl RecordSchema {
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// Type of a top-level field
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.field_type)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Arrow schema with every column nullable
    pub fn to_arrow_schema(&self) -> Schema {
        Schema::new(
            self.fields
                .iter()
                .map(|f| Field::new(f.name.clone(), f.field_type.to_arrow(), true))
                .collect::<Vec<_>>(),
        )
    }
}

/// Incremental schema inferrer for the records of one partition
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    /// Partition label used in conflict errors
    partition: String,
    fields: Vec<StructField>,
    index: HashMap<String, usize>,
    record_count: usize,
}

impl SchemaInferrer {
    /// Create an inferrer for the named partition
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            fields: Vec::new(),
            index: HashMap::new(),
            record_count: 0,
        }
    }

    /// Fold one record into the schema
    pub fn observe(&mut self, record: &Record) -> Result<()> {
        for (key, value) in record {
            let found = FieldType::infer(value)
                .map_err(|c| self.conflict(c.within(key.clone())))?;

            match self.index.get(key) {
                Some(&i) => {
                    let merged = self.fields[i]
                        .field_type
                        .merge(&found)
                        .map_err(|c| self.conflict(c.within(key.clone())))?;
                    self.fields[i].field_type = merged;
                }
                None => {
                    self.index.insert(key.clone(), self.fields.len());
                    self.fields.push(StructField::new(key.clone(), found));
                }
            }
        }
        self.record_count += 1;
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Finish inference
    pub fn finish(self) -> RecordSchema {
        RecordSchema {
            fields: self.fields,
        }
    }

    fn conflict(&self, conflict: MergeConflict) -> Error {
        Error::TypeConflict {
            partition: self.partition.clone(),
            field: conflict.field_path(),
            existing: conflict.existing.to_string(),
            found: conflict.found.to_string(),
        }
    }
}

/// Infer the schema of a set of records
pub fn infer_schema<'a, I>(partition: &str, records: I) -> Result<RecordSchema>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut inferrer = SchemaInferrer::new(partition);
    for record in records {
        inferrer.observe(record)?;
    }
    Ok(inferrer.finish())
}
