//! JSON document decoding
//!
//! An object holds zero or more JSON documents separated by whitespace, which
//! covers both NDJSON and concatenated multi-document files.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use serde_json::Deserializer;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decoder for streams of JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentDecoder;

impl JsonDocumentDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode every record in an object
    ///
    /// A top-level array contributes each element as a record. Any record
    /// that is not a JSON object is an error.
    pub fn decode(&self, object: &str, data: &[u8]) -> Result<Vec<Record>> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut stream = Deserializer::from_slice(data).into_iter::<JsonValue>();
        let mut records = Vec::new();
        let mut document = 0;

        loop {
            let offset = stream.byte_offset();
            let value = match stream.next() {
                None => break,
                Some(Ok(value)) => value,
                Some(Err(e)) => {
                    return Err(parse_error(object, document, offset, e.to_string()));
                }
            };

            match value {
                JsonValue::Object(record) => records.push(record),
                JsonValue::Array(items) => {
                    for (i, item) in items.into_iter().enumerate() {
                        match item {
                            JsonValue::Object(record) => records.push(record),
                            other => {
                                return Err(parse_error(
                                    object,
                                    document,
                                    offset,
                                    format!(
                                        "array element {i} is {}, expected an object",
                                        kind_of(&other)
                                    ),
                                ))
                            }
                        }
                    }
                }
                other => {
                    return Err(parse_error(
                        object,
                        document,
                        offset,
                        format!("document is {}, expected an object", kind_of(&other)),
                    ))
                }
            }
            document += 1;
        }

        Ok(records)
    }
}

fn parse_error(object: &str, document: usize, offset: usize, message: String) -> Error {
    Error::RecordParse {
        object: object.to_string(),
        document,
        offset,
        message,
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
