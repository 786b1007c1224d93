//! # Shard Appends
//!
//! The write side of the delta log: one record, one line, one write call.

use crate::CortexError;
use crate::formats::encode_line;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append `record` as a single JSON line to the shard at `path`.
///
/// Parent directories are created on demand. The line is encoded before the
/// file is opened, so an encoding failure leaves the shard untouched.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<(), CortexError> {
    let line = encode_line(record)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CortexError::io("Cannot create shard directory", parent, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CortexError::io("Cannot open shard", path, e))?;

    file.write_all(line.as_bytes())
        .map_err(|e| CortexError::io("Cannot append to shard", path, e))?;

    tracing::debug!(shard = %path.display(), bytes = line.len(), "record appended");
    Ok(())
}
