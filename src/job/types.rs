//! Job report types

use bytes::Bytes;
use serde::Serialize;

/// Outcome of a successful job run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub job_name: String,
    /// UTC timestamp identifying this run; part of every shard name
    pub run_id: String,
    pub source_location: String,
    pub destination_location: String,
    pub objects_read: usize,
    pub records_read: usize,
    pub records_written: usize,
    pub files_written: usize,
    pub bytes_written: usize,
    /// Objects removed by partition overwrite
    pub objects_replaced: usize,
    /// Partitions in sorted path order
    pub partitions: Vec<PartitionReport>,
    pub duration_ms: u64,
}

/// Per-partition summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionReport {
    /// Relative partition path, empty when unpartitioned
    pub path: String,
    pub records: usize,
    /// Data columns stored in the shards
    pub columns: usize,
    /// Shard keys relative to the destination
    pub files: Vec<String>,
}

/// An encoded shard waiting to be written
#[derive(Debug, Clone)]
pub(crate) struct ShardPlan {
    pub key: String,
    pub records: usize,
    pub data: Bytes,
}

/// Everything a partition contributes to the destination
#[derive(Debug, Clone)]
pub(crate) struct PartitionPlan {
    pub path: String,
    pub columns: usize,
    pub shards: Vec<ShardPlan>,
}

impl PartitionPlan {
    pub fn records(&self) -> usize {
        self.shards.iter().map(|s| s.records).sum()
    }
}
