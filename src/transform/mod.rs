//! Record transform module
//!
//! Supports: field rename, field drop
//!
//! # Overview
//!
//! Transforms are pure functions from record to record. A [`Projection`]
//! chains them in declaration order; the job builds one that renames first
//! and drops second. Records never depend on one another, so a projection
//! can be applied to records in any order or in parallel.

mod fields;
mod rules;

pub use fields::{DropFields, RenameFields};
pub use rules::{RenameRule, RenameRules};

use crate::types::Record;
use std::sync::Arc;

/// Trait for record-level transforms
pub trait RecordTransform: Send + Sync {
    /// Transform a single record
    fn apply(&self, record: Record) -> Record;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Ordered chain of record transforms
#[derive(Clone, Default)]
pub struct Projection {
    transforms: Vec<Arc<dyn RecordTransform>>,
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("transforms", &self.names())
            .finish()
    }
}

impl Projection {
    /// Create an empty projection (identity)
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename with `renames`, then drop `drops`
    pub fn rename_then_drop<I, S>(renames: RenameRules, drops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new()
            .add(RenameFields::new(renames))
            .add(DropFields::new(drops))
    }

    /// Append a transform
    #[must_use]
    pub fn add<T: RecordTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Apply every transform in order
    pub fn apply(&self, record: Record) -> Record {
        self.transforms
            .iter()
            .fold(record, |record, transform| transform.apply(record))
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Names of the chained transforms
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}
