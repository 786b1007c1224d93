//! # Snapshot Format
//!
//! The snapshot is one JSON document:
//!
//! ```json
//! { "timestamp": "2024-05-01T09:30:00.000000", "entities": [...], "relations": [...] }
//! ```
//!
//! Missing `entities` / `relations` arrays read as empty. The size limit is
//! checked before any parsing happens.
//!
//! Reading is per record: the document must be a JSON object, but a record
//! that does not decode is dropped on its own and reported, exactly like a
//! malformed delta line.

use crate::{CortexError, Entity, Relation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum accepted snapshot size (256 MB).
///
/// The engine targets thousands of records; anything this large is corrupt
/// or not a snapshot.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

/// A compacted serialization of the whole graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Generation time of the snapshot.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// All entities at compaction time.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// All relations at compaction time.
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Document shape on the read path. Records stay raw until decoded one by one.
#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    entities: Option<Vec<Value>>,
    #[serde(default)]
    relations: Option<Vec<Value>>,
}

/// A parsed snapshot together with the records that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRead {
    pub snapshot: Snapshot,
    /// One reason per record that could not be decoded.
    pub skipped: Vec<String>,
}

/// Serialize a snapshot as pretty-printed UTF-8 JSON.
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, CortexError> {
    let mut bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| CortexError::SerializationError(format!("Snapshot: {}", e)))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a snapshot document.
///
/// Fails on oversized input and on anything that is not a snapshot object.
/// Individual bad records are skipped and listed in [`SnapshotRead::skipped`].
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<SnapshotRead, CortexError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(CortexError::DeserializationError(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let raw: RawSnapshot = serde_json::from_slice(bytes)
        .map_err(|e| CortexError::DeserializationError(format!("Snapshot: {}", e)))?;

    let mut skipped = Vec::new();
    let entities = decode_records("entity", raw.entities.unwrap_or_default(), &mut skipped);
    let relations = decode_records("relation", raw.relations.unwrap_or_default(), &mut skipped);
    let timestamp = raw
        .timestamp
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(SnapshotRead {
        snapshot: Snapshot {
            timestamp,
            entities,
            relations,
        },
        skipped,
    })
}

fn decode_records<T: DeserializeOwned>(
    record: &str,
    values: Vec<Value>,
    skipped: &mut Vec<String>,
) -> Vec<T> {
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(decoded) => records.push(decoded),
            Err(e) => skipped.push(format!("{} #{}: {}", record, index, e)),
        }
    }
    records
}

// =============================================================================
// TESTS
// =============================================================================
