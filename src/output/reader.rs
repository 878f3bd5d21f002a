//! Reading partitioned Parquet output back into records

use super::convert::arrow_to_json;
use crate::error::{Error, Result, ResultExt};
use crate::partition::PartitionPath;
use crate::storage::StorageLocation;
use crate::types::Record;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

/// A record read back from a partitioned output
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedRecord {
    /// Partition the record was stored under
    pub partition: PartitionPath,
    /// Shard object, relative to the location
    pub object: String,
    pub record: Record,
}

/// Decode a Parquet file into records
pub fn decode_parquet(data: bytes::Bytes) -> Result<Vec<Record>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(arrow_to_json(&batch?)?);
    }
    Ok(records)
}

/// Read every Parquet shard under a location
///
/// Partition columns are parsed from the `key=value` directories and
/// appended to each record unless the record already carries them.
/// Shards are read in path order.
pub async fn read_partitioned(location: &StorageLocation) -> Result<Vec<PartitionedRecord>> {
    let objects = location
        .list()
        .await
        .map_err(|e| Error::source_unavailable(location.url(), e.to_string()))?;

    let mut out = Vec::new();
    for meta in objects {
        let relative = location.relative(&meta.location);
        if !relative.ends_with(".parquet") {
            continue;
        }

        let data = location
            .get(&meta.location)
            .await
            .map_err(|e| Error::source_unavailable(location.display(&meta.location), e.to_string()))?;
        let partition = PartitionPath::from_object_path(&relative);
        let columns = partition.typed_values();

        let records =
            decode_parquet(data).with_context(|| format!("Failed to decode shard {relative}"))?;
        debug!(object = %relative, records = records.len(), "Shard read");

        for mut record in records {
            for (key, value) in &columns {
                if !record.contains_key(key) {
                    record.insert(key.clone(), value.clone());
                }
            }
            out.push(PartitionedRecord {
                partition: partition.clone(),
                object: relative.clone(),
                record,
            });
        }
    }

    Ok(out)
}
