//! # Delta Line Codec
//!
//! Delta shards hold one JSON object per line. Decoding never fails as a
//! whole: each line is classified so the loader can skip bad ones and keep
//! going.

use crate::CortexError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Result of decoding one shard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome<T> {
    /// Whitespace-only line; ignored silently.
    Blank,
    /// A well-formed record.
    Record(T),
    /// Invalid JSON or a record missing a required field.
    Malformed(String),
}

/// Decode one line into a record.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> LineOutcome<T> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Blank;
    }

    match serde_json::from_str::<T>(trimmed) {
        Ok(record) => LineOutcome::Record(record),
        Err(e) => LineOutcome::Malformed(e.to_string()),
    }
}

/// Encode a record as a single line, newline included.
pub fn encode_line<T: Serialize>(record: &T) -> Result<String, CortexError> {
    let mut line = serde_json::to_string(record)
        .map_err(|e| CortexError::SerializationError(e.to_string()))?;
    line.push('\n');
    Ok(line)
}
