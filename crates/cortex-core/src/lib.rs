//! # cortex-core
//!
//! The storage-and-query engine of the Cortex personal knowledge graph.
//!
//! Durable state is a compacted JSON snapshot plus append-only JSONL delta
//! shards. Loading merges both into one in-memory graph; everything else
//! (search, connection finding, health analysis, export, validated writes)
//! works over that merged graph.
//!
//! ## Merge Rules
//!
//! - Entities: last write wins on `id`. Deltas beat the snapshot; later
//!   shards and lines beat earlier ones.
//! - Relations: first seen wins on `(src, rel, dst)`. A delta restating a
//!   compacted relation is dropped, never duplicated.
//!
//! ## Architectural Constraints
//!
//! - Synchronous, single process, single writer. No async, no network.
//! - `BTreeMap` ordering for every listing, so equal input gives equal output.
//! - Reads degrade gracefully over malformed data; writes fail closed.

// =============================================================================
// MODULES
// =============================================================================

pub mod cortex;
pub mod export;
pub mod formats;
pub mod graph;
pub mod mutation;
pub mod primitives;
pub mod query;
pub mod search;
pub mod storage;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CortexError, Endpoint, Entity, EntropyReport, Relation, RelationKey};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use cortex::{Cortex, CortexOptions};
pub use graph::KnowledgeGraph;
pub use mutation::MutationGateway;
pub use query::{
    Connections, EntityView, IncomingConnection, OutgoingConnection, find_connection,
    query_entity,
};
pub use search::{IndexedSearch, SearchBackend, SearchMode, Searcher, SubstringSearch};
pub use storage::{Layout, LoadReport, load, reconcile};

// =============================================================================
// RE-EXPORTS: Export and System
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use export::content_hash;
pub use export::{canonical_payload, export_mermaid, save_snapshot, snapshot_of};
pub use formats::Snapshot;
pub use system::{analyze_entropy, analyze_entropy_at, density, is_stale, parse_timestamp, validate_graph};
