//! Hive-style partition paths
//!
//! A partition path is an ordered list of `key=value` segments. Values are
//! escaped so that any string survives a trip through an object key.

use crate::types::JsonValue;
use std::fmt;

/// Characters that may not appear verbatim in a partition value
fn needs_escape(c: char) -> bool {
    c.is_ascii_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

/// Escape a key or value for use in a path segment
pub fn escape_path_name(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse [`escape_path_name`]; malformed escapes are kept verbatim
///
/// Escaped bytes are decoded as UTF-8, so multi-byte escapes written by
/// other Hive writers (`%C3%A3`) come back as one character.
pub fn unescape_path_name(escaped: &str) -> String {
    let bytes = escaped.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            if let Ok(code) = u8::from_str_radix(&escaped[i + 1..i + 3], 16) {
                out.push(code);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a partition value back into a typed JSON value
///
/// Integers, floats and booleans are recovered; everything else stays a
/// string.
pub fn parse_partition_value(raw: &str) -> JsonValue {
    if let Ok(i) = raw.parse::<i64>() {
        return JsonValue::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() && raw.contains(|c: char| c.is_ascii_digit()) {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return JsonValue::Number(n);
            }
        }
    }
    match raw {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        _ => JsonValue::String(raw.to_string()),
    }
}

/// Ordered `key=value` partition segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionPath {
    segments: Vec<(String, String)>,
}

impl PartitionPath {
    /// Create an empty (unpartitioned) path
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment
    #[must_use]
    pub fn with_segment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a segment in place
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.segments.push((key.into(), value.into()));
    }

    /// Raw (unescaped) segments
    pub fn segments(&self) -> &[(String, String)] {
        &self.segments
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Relative object path, e.g. `year=2023/month=5`
    pub fn to_path_string(&self) -> String {
        self.segments
            .iter()
            .map(|(k, v)| format!("{}={}", escape_path_name(k), escape_path_name(v)))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Extract the partition path from a relative object location
    ///
    /// Every directory segment of the form `key=value` contributes; the
    /// final segment (the file name) is ignored.
    pub fn from_object_path(relative: &str) -> Self {
        let mut path = Self::new();
        let mut parts: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        parts.pop();
        for part in parts {
            if let Some((key, value)) = part.split_once('=') {
                path.push(unescape_path_name(key), unescape_path_name(value));
            }
        }
        path
    }

    /// Typed values for re-attaching partition columns to records
    pub fn typed_values(&self) -> Vec<(String, JsonValue)> {
        self.segments
            .iter()
            .map(|(k, v)| (k.clone(), parse_partition_value(v)))
            .collect()
    }
}

impl fmt::Display for PartitionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            f.write_str("<unpartitioned>")
        } else {
            f.write_str(&self.to_path_string())
        }
    }
}
