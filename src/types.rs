//! Common types used throughout the projector
//!
//! Records travel through the pipeline as ordered JSON objects; the aliases
//! here keep signatures short.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// An ordered record: field name to dynamically typed value
pub type Record = serde_json::Map<String, JsonValue>;

// ============================================================================
// Provenance
// ============================================================================

/// Where a record came from, kept for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOrigin {
    /// Object path inside the source location
    pub object: String,
    /// Zero-based record index within the object
    pub index: usize,
}

impl RecordOrigin {
    /// Create a new origin
    pub fn new(object: impl Into<String>, index: usize) -> Self {
        Self {
            object: object.into(),
            index,
        }
    }
}

/// A record together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    pub origin: RecordOrigin,
    pub record: Record,
}

impl SourcedRecord {
    pub fn new(origin: RecordOrigin, record: Record) -> Self {
        Self { origin, record }
    }
}

// ============================================================================
// Write Mode
// ============================================================================

/// How shards are written to existing partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replace the contents of every partition this run writes
    #[default]
    Overwrite,
    /// Add new shards next to existing ones
    Append,
}

// ============================================================================
// Compression
// ============================================================================

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Uncompressed,
}

impl CompressionCodec {
    /// Codec tag used in shard file names
    pub fn file_tag(&self) -> &'static str {
        match self {
            CompressionCodec::Snappy => "snappy",
            CompressionCodec::Zstd => "zstd",
            CompressionCodec::Gzip => "gz",
            CompressionCodec::Uncompressed => "uncompressed",
        }
    }
}

impl std::str::FromStr for CompressionCodec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "gzip" | "gz" => Ok(Self::Gzip),
            "uncompressed" | "none" => Ok(Self::Uncompressed),
            other => Err(format!("unknown compression codec: {other}")),
        }
    }
}

impl std::str::FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            other => Err(format!("unknown write mode: {other}")),
        }
    }
}
