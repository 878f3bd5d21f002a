//! Field types

use arrow::datatypes::{DataType, Field, Fields};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Type of a record field, inferred from observed values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List(Box<FieldType>),
    Struct(Vec<StructField>),
}

/// Named member of a struct type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub field_type: FieldType,
}

impl StructField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Two incompatible types observed for the same field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    /// Path to the conflicting value, outermost first
    pub path: Vec<String>,
    pub existing: FieldType,
    pub found: FieldType,
}

impl MergeConflict {
    fn new(existing: &FieldType, found: &FieldType) -> Self {
        Self {
            path: Vec::new(),
            existing: existing.clone(),
            found: found.clone(),
        }
    }

    /// Prepend a path segment while unwinding
    #[must_use]
    pub fn within(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Dotted field path, `[]` marking list items
    pub fn field_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if segment == "[]" {
                out.push_str("[]");
            } else {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(segment);
            }
        }
        out
    }
}

impl FieldType {
    /// Infer the type of a single JSON value
    pub fn infer(value: &Value) -> Result<FieldType, MergeConflict> {
        match value {
            Value::Null => Ok(FieldType::Null),
            Value::Bool(_) => Ok(FieldType::Boolean),
            Value::Number(n) => {
                if n.is_i64() {
                    Ok(FieldType::Integer)
                } else {
                    Ok(FieldType::Float)
                }
            }
            Value::String(_) => Ok(FieldType::String),
            Value::Array(items) => {
                let mut item_type = FieldType::Null;
                for item in items {
                    let found = FieldType::infer(item).map_err(|c| c.within("[]"))?;
                    item_type = item_type.merge(&found).map_err(|c| c.within("[]"))?;
                }
                Ok(FieldType::List(Box::new(item_type)))
            }
            Value::Object(map) => {
                let mut fields = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let field_type = FieldType::infer(value).map_err(|c| c.within(key.clone()))?;
                    fields.push(StructField::new(key.clone(), field_type));
                }
                Ok(FieldType::Struct(fields))
            }
        }
    }

    /// Merge two observations of the same field
    ///
    /// Null merges with anything and integers widen to floats; any other
    /// mismatch is a conflict.
    pub fn merge(&self, other: &FieldType) -> Result<FieldType, MergeConflict> {
        match (self, other) {
            (FieldType::Null, t) | (t, FieldType::Null) => Ok(t.clone()),
            (FieldType::Integer, FieldType::Float) | (FieldType::Float, FieldType::Integer) => {
                Ok(FieldType::Float)
            }
            (FieldType::List(a), FieldType::List(b)) => a
                .merge(b)
                .map(|item| FieldType::List(Box::new(item)))
                .map_err(|c| c.within("[]")),
            (FieldType::Struct(a), FieldType::Struct(b)) => merge_struct_fields(a, b),
            (a, b) if a == b => Ok(a.clone()),
            (a, b) => Err(MergeConflict::new(a, b)),
        }
    }

    /// Arrow type used for the Parquet column
    ///
    /// Structs without members have no Parquet representation and are
    /// stored as all-null columns.
    pub fn to_arrow(&self) -> DataType {
        match self {
            FieldType::Null => DataType::Null,
            FieldType::Boolean => DataType::Boolean,
            FieldType::Integer => DataType::Int64,
            FieldType::Float => DataType::Float64,
            FieldType::String => DataType::Utf8,
            FieldType::List(item) => {
                DataType::List(Arc::new(Field::new("item", item.to_arrow(), true)))
            }
            FieldType::Struct(fields) if fields.is_empty() => DataType::Null,
            FieldType::Struct(fields) => DataType::Struct(Fields::from(
                fields
                    .iter()
                    .map(|f| Field::new(f.name.clone(), f.field_type.to_arrow(), true))
                    .collect::<Vec<_>>(),
            )),
        }
    }
}

fn merge_struct_fields(
    existing: &[StructField],
    found: &[StructField],
) -> Result<FieldType, MergeConflict> {
    let mut merged: Vec<StructField> = existing.to_vec();
    for field in found {
        match merged.iter_mut().find(|f| f.name == field.name) {
            Some(slot) => {
                slot.field_type = slot
                    .field_type
                    .merge(&field.field_type)
                    .map_err(|c| c.within(field.name.clone()))?;
            }
            None => merged.push(field.clone()),
        }
    }
    Ok(FieldType::Struct(merged))
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Null => write!(f, "null"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::String => write!(f, "string"),
            FieldType::List(item) => write!(f, "list<{item}>"),
            FieldType::Struct(_) => write!(f, "struct"),
        }
    }
}
