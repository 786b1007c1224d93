//! # Persistence Loader
//!
//! Reads the snapshot and all delta shards of a brain root and merges them
//! through the [`Reconciler`].
//!
//! ## Failure Model
//!
//! - Malformed delta lines are skipped with a warning.
//! - Snapshot records that do not decode are skipped one by one, like
//!   malformed delta lines.
//! - A snapshot that is not a JSON object at all is skipped with a warning;
//!   the deltas are still the ground truth for everything written since the
//!   last compaction.
//! - Unreadable files and directories abort the load.

use super::layout::Layout;
use super::reconcile::{LoadReport, Reconciler};
use crate::formats::{LineOutcome, decode_line, snapshot_from_bytes};
use crate::graph::KnowledgeGraph;
use crate::{CortexError, Entity, Relation};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;

/// Load and merge the whole brain.
///
/// Repeated calls over unchanged files produce identical graphs: shards are
/// read in sorted path order and lines in file order.
pub fn load(layout: &Layout) -> Result<(KnowledgeGraph, LoadReport), CortexError> {
    let mut reconciler = read_snapshot(layout)?;

    let entity_shards = layout.entity_shards()?;
    for path in &entity_shards {
        read_shard::<Entity>(path, &mut reconciler, |r, entity| r.apply_entity(entity))?;
    }

    let relation_shards = layout.relation_shards()?;
    for path in &relation_shards {
        read_shard::<Relation>(path, &mut reconciler, |r, relation| {
            r.apply_relation(relation);
        })?;
    }

    reconciler.report_mut().shard_files = entity_shards.len() + relation_shards.len();
    let (graph, report) = reconciler.finish();

    tracing::info!(
        entities = graph.entity_count(),
        relations = graph.relation_count(),
        shards = report.shard_files,
        snapshot = report.snapshot_loaded,
        skipped = report.lines_skipped,
        "graph loaded"
    );

    Ok((graph, report))
}

/// Seed the merge from the snapshot, if there is a usable one.
fn read_snapshot(layout: &Layout) -> Result<Reconciler, CortexError> {
    let path = layout.snapshot_path();
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Reconciler::new()),
        Err(e) => return Err(CortexError::io("Cannot read snapshot", &path, e)),
    };

    match snapshot_from_bytes(&bytes) {
        Ok(read) => {
            for reason in &read.skipped {
                tracing::warn!(path = %path.display(), %reason, "skipping malformed snapshot record");
            }
            tracing::info!(
                path = %path.display(),
                entities = read.snapshot.entities.len(),
                relations = read.snapshot.relations.len(),
                skipped = read.skipped.len(),
                "snapshot loaded"
            );
            let mut reconciler = Reconciler::from_snapshot(read.snapshot);
            reconciler.report_mut().snapshot_records_skipped = read.skipped.len();
            Ok(reconciler)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable snapshot");
            let mut reconciler = Reconciler::new();
            reconciler.report_mut().snapshot_rejected = true;
            Ok(reconciler)
        }
    }
}

/// Decode every line of one shard and hand the records to `apply`.
fn read_shard<T: DeserializeOwned>(
    path: &Path,
    reconciler: &mut Reconciler,
    mut apply: impl FnMut(&mut Reconciler, T),
) -> Result<(), CortexError> {
    let bytes = std::fs::read(path).map_err(|e| CortexError::io("Cannot read shard", path, e))?;

    for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_no = index + 1;
        let Ok(line) = std::str::from_utf8(raw) else {
            tracing::warn!(shard = %path.display(), line = line_no, "skipping non UTF-8 line");
            reconciler.report_mut().lines_skipped += 1;
            continue;
        };

        match decode_line::<T>(line) {
            LineOutcome::Blank => {}
            LineOutcome::Record(record) => apply(&mut *reconciler, record),
            LineOutcome::Malformed(reason) => {
                tracing::warn!(shard = %path.display(), line = line_no, %reason, "skipping malformed line");
                reconciler.report_mut().lines_skipped += 1;
            }
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
