// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Record Projector
//!
//! A batch job that reads JSON records from object storage, renames and
//! drops fields, and writes the result back as Hive-partitioned Parquet.
//!
//! ## Features
//!
//! - **Object Storage**: S3, R2, GCS, Azure Blob and local paths
//! - **Streaming JSON Input**: NDJSON, concatenated documents, top-level arrays
//! - **Field Projection**: Simultaneous renames (including nested fields), then drops
//! - **Hive Partitioning**: `key=value` directories in partition key order
//! - **Typed Parquet Output**: Per-partition schema inference with explicit type conflicts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use record_projector::{JobConfig, TransformJob, Result};
//! use record_projector::transform::RenameRules;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = JobConfig::new(
//!         "raw_to_processed",
//!         "s3://my-data-lake-bucket25/raw/",
//!         "s3://my-data-lake-bucket25/processed/",
//!     )
//!     .with_rename_rules(RenameRules::from_pairs([("name", "full_name")])?)
//!     .with_drop_fields(["unnecessary_column"])
//!     .with_partition_keys(["year", "month"]);
//!
//!     let result = TransformJob::new(config).run().await?;
//!     println!("{} records written", result.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          TransformJob                           │
//! │  Read → Rename → Drop → Partition → Infer → Encode → Write      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Source  │ Transform │   Partition   │  Schema   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ List     │ Rename    │ Key values    │ Infer     │ Arrow       │
//! │ Decode   │ Drop      │ Hive paths    │ Merge     │ Parquet     │
//! │ Origins  │           │ Grouping      │ Conflicts │ Read back   │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//!                                │
//!                   Storage (S3 / R2 / GCS / Azure / local)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the projector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Job configuration, loading and validation
pub mod config;

/// Object storage locations
pub mod storage;

/// Source listing and JSON decoding
pub mod source;

/// Rename and drop transforms
pub mod transform;

/// Partition routing and Hive paths
pub mod partition;

/// Schema inference from JSON records
pub mod schema;

/// Arrow/Parquet output
pub mod output;

/// Pipeline orchestration
pub mod job;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::JobConfig;
pub use error::{Error, ErrorKind, Result};
pub use job::{TransformJob, TransformResult};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
