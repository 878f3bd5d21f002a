//! CLI commands and argument parsing

use crate::config::{JobConfig, JobOverrides};
use crate::error::Result;
use crate::transform::RenameRule;
use crate::types::{CompressionCodec, WriteMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Batch JSON to partitioned Parquet projector
#[derive(Parser, Debug)]
#[command(name = "record-projector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for stdout messages
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a transform job
    Run(JobArgs),

    /// Load and validate a job config without running it
    Validate(JobArgs),

    /// Print the records of a partitioned Parquet output
    Inspect {
        /// Output location (local path or cloud URL)
        /// Supports: /path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
        location: String,

        /// Maximum records to print
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Job definition: a config file, inline flags, or both
#[derive(Args, Debug, Clone, Default)]
pub struct JobArgs {
    /// Job name
    #[arg(long = "job-name", alias = "JOB_NAME")]
    pub job_name: Option<String>,

    /// Job config file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Source location
    #[arg(long)]
    pub source: Option<String>,

    /// Destination location
    #[arg(long)]
    pub destination: Option<String>,

    /// Rename a field (repeatable)
    #[arg(long = "rename", value_name = "OLD=NEW", value_parser = parse_rename)]
    pub renames: Vec<RenameRule>,

    /// Drop a field after renaming (repeatable)
    #[arg(long = "drop", value_name = "FIELD")]
    pub drops: Vec<String>,

    /// Partition key, in nesting order (repeatable)
    #[arg(long = "partition-key", value_name = "KEY")]
    pub partition_keys: Vec<String>,

    /// Maximum records per Parquet file (0 = one file per partition)
    #[arg(long)]
    pub max_records_per_file: Option<usize>,

    /// Compression codec: snappy, zstd, gzip, uncompressed
    #[arg(long)]
    pub compression: Option<CompressionCodec>,

    /// Write mode: overwrite, append
    #[arg(long)]
    pub write_mode: Option<WriteMode>,
}

impl JobArgs {
    /// Build the job config: file values first, then flags
    pub fn to_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::from_file(path)?,
            None => JobConfig::new("", "", ""),
        };

        config.apply_overrides(JobOverrides {
            job_name: self.job_name.clone(),
            source_location: self.source.clone(),
            destination_location: self.destination.clone(),
            renames: self.renames.clone(),
            drops: self.drops.clone(),
            partition_keys: self.partition_keys.clone(),
            max_records_per_file: self.max_records_per_file,
            compression: self.compression,
            write_mode: self.write_mode,
        });
        Ok(config)
    }
}

fn parse_rename(spec: &str) -> std::result::Result<RenameRule, String> {
    RenameRule::parse(spec).map_err(|e| e.to_string())
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
