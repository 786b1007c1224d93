//! # Storage
//!
//! The durable record is a compacted snapshot plus append-only delta shards.
//!
//! - `layout`: path conventions and shard discovery
//! - `reconcile`: the merge with its precedence rules
//! - `loader`: reads everything and feeds the merge
//! - `shard`: single-line appends for the write path

pub mod layout;
pub mod loader;
pub mod reconcile;
pub mod shard;

pub use layout::Layout;
pub use loader::load;
pub use reconcile::{LoadReport, Reconciler, reconcile};
pub use shard::append_record;
