//! Routing records to partitions

use super::path::PartitionPath;
use crate::error::{Error, Result};
use crate::types::{JsonValue, SourcedRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Records grouped by partition, in sorted partition order
#[derive(Debug, Clone, Default)]
pub struct PartitionGroups {
    groups: BTreeMap<PartitionPath, Vec<SourcedRecord>>,
}

impl PartitionGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total records across all partitions
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Records of a single partition
    pub fn get(&self, path: &PartitionPath) -> Option<&[SourcedRecord]> {
        self.groups.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &PartitionPath> {
        self.groups.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartitionPath, &Vec<SourcedRecord>)> {
        self.groups.iter()
    }
}

impl IntoIterator for PartitionGroups {
    type Item = (PartitionPath, Vec<SourcedRecord>);
    type IntoIter = std::collections::btree_map::IntoIter<PartitionPath, Vec<SourcedRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Groups records by the values of an ordered list of key fields
#[derive(Debug, Clone, Default)]
pub struct Partitioner {
    keys: Vec<String>,
    retain_columns: bool,
}

impl Partitioner {
    /// Create a partitioner for the given keys
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            retain_columns: false,
        }
    }

    /// Keep partition columns inside the records
    #[must_use]
    pub fn with_retained_columns(mut self, retain: bool) -> Self {
        self.retain_columns = retain;
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Compute the partition path of a record
    pub fn partition_path(&self, sourced: &SourcedRecord) -> Result<PartitionPath> {
        let mut path = PartitionPath::new();
        for key in &self.keys {
            let value = match sourced.record.get(key) {
                None | Some(JsonValue::Null) => {
                    return Err(Error::PartitionKeyMissing {
                        key: key.clone(),
                        object: sourced.origin.object.clone(),
                        record: sourced.origin.index,
                    })
                }
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Number(n)) => n.to_string(),
                Some(JsonValue::Bool(b)) => b.to_string(),
                Some(JsonValue::Array(_) | JsonValue::Object(_)) => {
                    return Err(Error::InvalidPartitionValue {
                        key: key.clone(),
                        object: sourced.origin.object.clone(),
                        record: sourced.origin.index,
                    })
                }
            };
            path.push(key.clone(), value);
        }
        Ok(path)
    }

    /// Route every record, failing on the first one without a usable key
    ///
    /// Partition columns are stripped unless retained. A partition whose
    /// records hold nothing but key fields keeps them, so its shards still
    /// have at least one column.
    pub fn split(&self, records: Vec<SourcedRecord>) -> Result<PartitionGroups> {
        let mut groups: BTreeMap<PartitionPath, Vec<SourcedRecord>> = BTreeMap::new();

        for sourced in records {
            let path = self.partition_path(&sourced)?;
            groups.entry(path).or_default().push(sourced);
        }

        if !self.retain_columns && !self.keys.is_empty() {
            for (path, records) in &mut groups {
                if !records.iter().any(|r| self.has_data_fields(r)) {
                    debug!(partition = %path, "Partition has only key fields, keeping them");
                    continue;
                }
                for sourced in records.iter_mut() {
                    sourced.record = std::mem::take(&mut sourced.record)
                        .into_iter()
                        .filter(|(k, _)| !self.keys.contains(k))
                        .collect();
                }
            }
        }

        Ok(PartitionGroups { groups })
    }

    fn has_data_fields(&self, sourced: &SourcedRecord) -> bool {
        sourced.record.keys().any(|k| !self.keys.contains(k))
    }
}
