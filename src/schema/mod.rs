//! Schema inference module
//!
//! Records carry no declared schema. Column types are inferred per partition
//! from the values observed, using a tagged union of field types.
//!
//! # Features
//!
//! - **Type Inference**: Infers a [`FieldType`] from every JSON value
//! - **Schema Merging**: Null merges with anything, integers widen to floats
//! - **Conflict Detection**: Any other mismatch is a `TypeConflict` error
//! - **Nested Support**: Lists and objects are inferred recursively

mod inference;
mod types;

pub use inference::{infer_schema, RecordSchema, SchemaInferrer};
pub use types::{FieldType, MergeConflict, StructField};
