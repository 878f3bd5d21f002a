//! Source reading module
//!
//! # Overview
//!
//! A source is an object-store prefix holding JSON documents. Every object
//! under the prefix is fetched, in path order, and decoded into records that
//! remember where they came from. Objects whose name starts with `_` or `.`
//! are skipped.

mod decoder;
mod reader;

pub use decoder::JsonDocumentDecoder;
pub use reader::{ObjectStoreSource, RecordSource, SourceBatch, DEFAULT_READ_CONCURRENCY};
