//! # Primitives
//!
//! Fixed constants of the on-disk layout and the analysis defaults.
//!
//! ## Layout
//!
//! ```text
//! <root>/knowledge/snapshot.json
//! <root>/knowledge/entities/**/*.jsonl
//! <root>/knowledge/relations/**/YYYY-MM.jsonl
//! ```

/// Directory under the brain root holding all graph data.
pub const KNOWLEDGE_DIR: &str = "knowledge";

/// Directory (under `KNOWLEDGE_DIR`) holding entity delta shards.
pub const ENTITIES_DIR: &str = "entities";

/// Directory (under `KNOWLEDGE_DIR`) holding relation delta shards.
pub const RELATIONS_DIR: &str = "relations";

/// File name of the compacted snapshot (under `KNOWLEDGE_DIR`).
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Extension of delta shard files. Anything else in the shard trees is ignored.
pub const SHARD_EXTENSION: &str = "jsonl";

/// `strftime` pattern naming relation shards by year-month.
pub const RELATION_SHARD_PATTERN: &str = "%Y-%m";

/// Default age, in days, after which an entity is considered stale.
pub const DEFAULT_STALE_DAYS: u32 = 30;

/// `strftime` pattern used when the engine stamps a timestamp itself.
///
/// Naive local time with microseconds, e.g. `2024-05-01T09:30:00.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Characters removed from diagram labels because they break Mermaid syntax.
pub const DIAGRAM_UNSAFE_CHARS: &[char] = &['"', '(', ')'];
