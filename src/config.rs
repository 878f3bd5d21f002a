//! Job configuration
//!
//! A job is described by a [`JobConfig`], loaded from YAML or JSON and
//! optionally overridden from the command line. Every field of the
//! transform contract is an explicit member; nothing is read from ambient
//! job arguments.

use crate::error::{Error, Result};
use crate::output::ParquetWriterConfig;
use crate::source::DEFAULT_READ_CONCURRENCY;
use crate::storage::LocationKey;
use crate::transform::{RenameRule, RenameRules};
use crate::types::{CompressionCodec, WriteMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

// ============================================================================
// Top-Level Job Config
// ============================================================================

/// Complete job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name, reported in logs and the summary
    #[serde(default)]
    pub job_name: String,

    /// URI of the JSON source prefix
    #[serde(default)]
    pub source_location: String,

    /// URI of the Parquet destination prefix
    #[serde(default)]
    pub destination_location: String,

    /// Old field name to new field name
    #[serde(default)]
    pub rename_rules: RenameRules,

    /// Fields removed after renaming
    #[serde(default)]
    pub drop_field_names: Vec<String>,

    /// Ordered partition key fields
    #[serde(default)]
    pub partition_keys: Vec<String>,

    /// Source reading options
    #[serde(default)]
    pub source: SourceOptions,

    /// Output writing options
    #[serde(default)]
    pub output: OutputOptions,
}

/// Source reading options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Objects fetched concurrently
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            read_concurrency: default_read_concurrency(),
        }
    }
}

fn default_read_concurrency() -> usize {
    DEFAULT_READ_CONCURRENCY
}

/// Output writing options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Parquet compression codec
    #[serde(default)]
    pub compression: CompressionCodec,

    /// Maximum records per shard (0 = one shard per partition)
    #[serde(default)]
    pub max_records_per_file: usize,

    /// Overwrite written partitions or append to them
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Keep partition columns inside the data files
    #[serde(default)]
    pub retain_partition_columns: bool,

    /// Write a `_SUCCESS` object after all shards
    #[serde(default = "default_true")]
    pub write_success_marker: bool,

    /// Rows per Parquet row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            compression: CompressionCodec::default(),
            max_records_per_file: 0,
            write_mode: WriteMode::default(),
            retain_partition_columns: false,
            write_success_marker: true,
            row_group_size: default_row_group_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

// ============================================================================
// Overrides
// ============================================================================

/// Values supplied on the command line, layered over a config file
#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    pub job_name: Option<String>,
    pub source_location: Option<String>,
    pub destination_location: Option<String>,
    /// Added to the rules, replacing a rule with the same source
    pub renames: Vec<RenameRule>,
    /// Added to the drop list
    pub drops: Vec<String>,
    /// Replaces the partition keys when non-empty
    pub partition_keys: Vec<String>,
    pub max_records_per_file: Option<usize>,
    pub compression: Option<CompressionCodec>,
    pub write_mode: Option<WriteMode>,
}

// ============================================================================
// Loading & Validation
// ============================================================================

impl JobConfig {
    /// Create a config with no rules
    pub fn new(
        job_name: impl Into<String>,
        source_location: impl Into<String>,
        destination_location: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            source_location: source_location.into(),
            destination_location: destination_location.into(),
            rename_rules: RenameRules::new(),
            drop_field_names: Vec::new(),
            partition_keys: Vec::new(),
            source: SourceOptions::default(),
            output: OutputOptions::default(),
        }
    }

    #[must_use]
    pub fn with_rename_rules(mut self, rules: RenameRules) -> Self {
        self.rename_rules = rules;
        self
    }

    #[must_use]
    pub fn with_drop_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_field_names = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_partition_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    /// Load a config from a YAML or JSON file
    ///
    /// The result is not validated; overrides may still fill in fields.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a config from a YAML (or JSON) string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Layer command-line values over this config
    pub fn apply_overrides(&mut self, overrides: JobOverrides) {
        if let Some(name) = overrides.job_name {
            self.job_name = name;
        }
        if let Some(source) = overrides.source_location {
            self.source_location = source;
        }
        if let Some(destination) = overrides.destination_location {
            self.destination_location = destination;
        }
        for rule in overrides.renames {
            self.rename_rules.upsert(rule);
        }
        for field in overrides.drops {
            if !self.drop_field_names.contains(&field) {
                self.drop_field_names.push(field);
            }
        }
        if !overrides.partition_keys.is_empty() {
            self.partition_keys = overrides.partition_keys;
        }
        if let Some(max) = overrides.max_records_per_file {
            self.output.max_records_per_file = max;
        }
        if let Some(codec) = overrides.compression {
            self.output.compression = codec;
        }
        if let Some(mode) = overrides.write_mode {
            self.output.write_mode = mode;
        }
    }

    /// Check the config before any I/O happens
    pub fn validate(&self) -> Result<()> {
        if self.job_name.trim().is_empty() {
            return Err(Error::missing_field("job_name"));
        }
        if self.source_location.trim().is_empty() {
            return Err(Error::missing_field("source_location"));
        }
        if self.destination_location.trim().is_empty() {
            return Err(Error::missing_field("destination_location"));
        }

        let source = LocationKey::parse(&self.source_location)?;
        let destination = LocationKey::parse(&self.destination_location)?;
        if source.overlaps(&destination) {
            return Err(Error::invalid_value(
                "destination_location",
                "must not overlap the source location",
            ));
        }

        self.rename_rules.validate()?;

        if self.drop_field_names.iter().any(|f| f.is_empty()) {
            return Err(Error::invalid_value(
                "drop_field_names",
                "field names cannot be empty",
            ));
        }

        let mut seen = HashSet::new();
        for key in &self.partition_keys {
            if key.is_empty() {
                return Err(Error::invalid_value(
                    "partition_keys",
                    "key names cannot be empty",
                ));
            }
            if !seen.insert(key.as_str()) {
                return Err(Error::invalid_value(
                    "partition_keys",
                    format!("duplicate partition key '{key}'"),
                ));
            }
            if self.drop_field_names.contains(key) {
                return Err(Error::invalid_value(
                    "partition_keys",
                    format!("partition key '{key}' is also dropped"),
                ));
            }
            if self.rename_rules.is_source(key) && !self.rename_rules.is_target(key) {
                return Err(Error::invalid_value(
                    "partition_keys",
                    format!("partition key '{key}' is renamed away"),
                ));
            }
        }

        if self.source.read_concurrency == 0 {
            return Err(Error::invalid_value(
                "source.read_concurrency",
                "must be at least 1",
            ));
        }
        if self.output.row_group_size == 0 {
            return Err(Error::invalid_value(
                "output.row_group_size",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Parquet writer settings for this job
    pub fn writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::new()
            .with_codec(self.output.compression)
            .with_row_group_size(self.output.row_group_size)
    }
}
