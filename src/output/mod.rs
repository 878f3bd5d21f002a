//! Output module
//!
//! Handles Arrow RecordBatch creation and Parquet encoding.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Converting records to Arrow RecordBatches with an inferred schema
//! - Encoding Parquet shards in memory
//! - Reading partitioned Parquet output back into records

mod convert;
mod reader;
mod writer;

pub use convert::{arrow_to_json, json_to_arrow};
pub use reader::{decode_parquet, read_partitioned, PartitionedRecord};
pub use writer::{encode_parquet, ParquetWriterConfig};
