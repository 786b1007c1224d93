//! # Formats
//!
//! Wire formats of the durable record:
//! - `snapshot`: the single JSON document written by compaction
//! - `jsonl`: one JSON object per line, used by delta shards
//!
//! These are pure transformations. File I/O lives in [`crate::storage`].

pub mod jsonl;
pub mod snapshot;

pub use jsonl::{LineOutcome, decode_line, encode_line};
pub use snapshot::{
    MAX_SNAPSHOT_SIZE, Snapshot, SnapshotRead, snapshot_from_bytes, snapshot_to_bytes,
};
