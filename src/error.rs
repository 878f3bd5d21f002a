//! Error types for the record projector
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every error is fatal to a job invocation; [`Error::kind`] names the class
//! reported to the caller.

use thiserror::Error;

/// The main error type
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Source unavailable: {location}: {message}")]
    SourceUnavailable { location: String, message: String },

    #[error("Malformed record in {object} (document {document}, byte {offset}): {message}")]
    RecordParse {
        object: String,
        document: usize,
        offset: usize,
        message: String,
    },

    // ============================================================================
    // Partition Errors
    // ============================================================================
    #[error("Partition key '{key}' missing from record {record} ({object})")]
    PartitionKeyMissing {
        key: String,
        object: String,
        record: usize,
    },

    #[error("Partition key '{key}' of record {record} ({object}) has a non-scalar value")]
    InvalidPartitionValue {
        key: String,
        object: String,
        record: usize,
    },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Type conflict in partition '{partition}' for field '{field}': {existing} vs {found}")]
    TypeConflict {
        partition: String,
        field: String,
        existing: String,
        found: String,
    },

    // ============================================================================
    // Destination Errors
    // ============================================================================
    #[error("Destination unavailable: {location}: {message}")]
    DestinationUnavailable { location: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Error class reported for a failed job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    SourceUnavailable,
    RecordParseError,
    PartitionKeyMissing,
    InvalidPartitionValue,
    TypeConflict,
    DestinationUnavailable,
    Internal,
}

impl ErrorKind {
    /// Stable name of the error class
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "Config",
            ErrorKind::SourceUnavailable => "SourceUnavailable",
            ErrorKind::RecordParseError => "RecordParseError",
            ErrorKind::PartitionKeyMissing => "PartitionKeyMissing",
            ErrorKind::InvalidPartitionValue => "InvalidPartitionValue",
            ErrorKind::TypeConflict => "TypeConflict",
            ErrorKind::DestinationUnavailable => "DestinationUnavailable",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a destination unavailable error
    pub fn destination_unavailable(
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DestinationUnavailable {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_) => ErrorKind::Config,
            Error::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            Error::RecordParse { .. } => ErrorKind::RecordParseError,
            Error::PartitionKeyMissing { .. } => ErrorKind::PartitionKeyMissing,
            Error::InvalidPartitionValue { .. } => ErrorKind::InvalidPartitionValue,
            Error::TypeConflict { .. } => ErrorKind::TypeConflict,
            Error::DestinationUnavailable { .. } => ErrorKind::DestinationUnavailable,
            Error::Arrow(_) | Error::Parquet(_) | Error::Output { .. } | Error::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Config => 2,
            _ => 1,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
