//! Partition routing module
//!
//! # Overview
//!
//! Output records are grouped by the values of the configured partition
//! keys. Each group is written under a Hive-style directory
//! (`year=2023/month=5/`), nested in key order. A record without a usable
//! value for every key fails the job; there is no default partition.

mod partitioner;
mod path;

pub use partitioner::{PartitionGroups, Partitioner};
pub use path::{escape_path_name, parse_partition_value, unescape_path_name, PartitionPath};

#[cfg(test)]
mod tests;
