//! # Core Type Definitions
//!
//! This module contains the record model for the Cortex knowledge graph:
//! - Nodes and edges (`Entity`, `Relation`) and the relation identity key
//! - The derived health report (`EntropyReport`)
//! - Error types (`CortexError`)
//!
//! ## Value Semantics
//!
//! Records are plain owned values. The engine stores them in owned maps and
//! hands out shared references only; mutation goes through the gateway in
//! [`crate::mutation`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Read an optional field, treating `null` like an absent key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// ENTITY
// =============================================================================

/// A node in the knowledge graph.
///
/// `id` is the identity and the only required field when a record is read
/// from storage; every other field falls back to its empty value when it is
/// absent or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique, immutable identifier.
    pub id: String,
    /// Free-form category tag (`concept`, `tech`, `person`, ...).
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    /// Human readable name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Free text description.
    #[serde(default, deserialize_with = "nullable")]
    pub desc: String,
    /// Tags; order is preserved but irrelevant for matching.
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// ISO-8601 timestamp of the last update; empty means "never recorded".
    #[serde(default, deserialize_with = "nullable")]
    pub updated_at: String,
}

impl Entity {
    /// Create an entity with empty tags and no timestamp.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: name.into(),
            desc: desc.into(),
            tags: Vec::new(),
            updated_at: String::new(),
        }
    }

    /// Builder-style tag assignment.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style timestamp assignment.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = updated_at.into();
        self
    }
}

// =============================================================================
// RELATION
// =============================================================================

/// A directed, typed edge `src -[rel]-> dst`.
///
/// `context` and `created_at` are payload; identity is the [`RelationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Source entity id.
    pub src: String,
    /// Relation label (`uses`, `is_a`, ...).
    #[serde(default, deserialize_with = "nullable")]
    pub rel: String,
    /// Destination entity id.
    pub dst: String,
    /// Free text context, typically where the connection was learned.
    #[serde(default, deserialize_with = "nullable")]
    pub context: String,
    /// ISO-8601 creation timestamp.
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
}

impl Relation {
    /// Create a relation with empty context and no timestamp.
    #[must_use]
    pub fn new(src: impl Into<String>, rel: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            rel: rel.into(),
            dst: dst.into(),
            context: String::new(),
            created_at: String::new(),
        }
    }

    /// Builder-style context assignment.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Builder-style timestamp assignment.
    #[must_use]
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// The de-duplication key of this relation.
    #[must_use]
    pub fn key(&self) -> RelationKey {
        RelationKey {
            src: self.src.clone(),
            rel: self.rel.clone(),
            dst: self.dst.clone(),
        }
    }
}

/// Identity of a relation: exactly the `(src, rel, dst)` triple.
///
/// Two relations that differ only in `context` or `created_at` share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationKey {
    pub src: String,
    pub rel: String,
    pub dst: String,
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.src, self.rel, self.dst)
    }
}

// =============================================================================
// ENTROPY REPORT
// =============================================================================

/// Point-in-time health report of the graph. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyReport {
    /// Number of entities.
    pub total_nodes: usize,
    /// Number of relations, dangling ones included.
    pub total_edges: usize,
    /// Entities with zero in-degree and zero out-degree.
    pub orphan_nodes: Vec<String>,
    /// Entities whose timestamp is missing, unparsable or too old.
    pub stale_nodes: Vec<String>,
    /// Descriptions of relations whose endpoints are unknown.
    pub broken_links: Vec<String>,
    /// `edges / (n * (n - 1))`, or `0` for `n <= 1`.
    pub density: f64,
}

impl EntropyReport {
    /// True when the read path found no referential-integrity problems.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.broken_links.is_empty()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Which end of a relation an integrity error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => f.write_str("Source"),
            Endpoint::Destination => f.write_str("Destination"),
        }
    }
}

/// Errors that can occur in the Cortex engine.
///
/// Read-path problems (malformed delta lines, dangling relations) are not
/// errors; they are skipped or reported as data. Everything here is either a
/// rejected write or a failed I/O operation.
#[derive(Debug, Error)]
pub enum CortexError {
    /// Mutation input is missing a required field or has a wrong type.
    #[error("Invalid {record} schema: {reason}")]
    Schema {
        record: &'static str,
        reason: String,
    },

    /// An entity with this id already exists.
    #[error("Integrity error: entity '{0}' already exists")]
    DuplicateEntity(String),

    /// A new relation references an entity that does not exist.
    #[error("Integrity error: {endpoint} '{id}' not found")]
    UnknownEndpoint { endpoint: Endpoint, id: String },

    /// A relation with the same `(src, rel, dst)` triple already exists.
    #[error("Integrity error: relation {0} already exists")]
    DuplicateRelation(RelationKey),

    /// Compaction refused: the snapshot on disk was not fully loaded, so
    /// overwriting it would drop records.
    #[error("Refusing to compact: snapshot '{0}' was not fully readable; repair or remove it first")]
    IncompleteSnapshot(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A whole-document deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl CortexError {
    /// Schema error for a record kind (`"entity"`, `"relation"`).
    pub(crate) fn schema(record: &'static str, reason: impl Into<String>) -> Self {
        Self::Schema {
            record,
            reason: reason.into(),
        }
    }

    /// Shorthand for an entity schema error.
    pub(crate) fn entity_schema(reason: impl Into<String>) -> Self {
        Self::schema("entity", reason)
    }

    /// Wrap an I/O error with the path it happened on.
    pub(crate) fn io(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        Self::IoError(format!("{} '{}': {}", action, path.display(), err))
    }
}

// =============================================================================
// TESTS
// =============================================================================
