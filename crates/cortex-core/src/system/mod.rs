//! # System Health
//!
//! Diagnostics over the merged graph. Nothing here mutates the graph or
//! blocks a read; every finding is returned as data.
//!
//! - `integrity`: positional broken-link findings
//! - `entropy`: orphans, staleness and density

mod entropy;
mod integrity;

pub use entropy::*;
pub use integrity::*;
