//! # Reconciliation
//!
//! The single place where snapshot content and delta records are merged.
//!
//! ## Precedence Rules
//!
//! | Record   | Key                 | Rule                                              |
//! |----------|---------------------|---------------------------------------------------|
//! | Entity   | `id`                | last write wins: delta over snapshot, later over earlier |
//! | Relation | `(src, rel, dst)`   | first seen wins: snapshot first, then deltas in order |
//!
//! The relation seen-set is shared by the snapshot and every delta, so a
//! triple restated after compaction is dropped instead of duplicated. This
//! also applies to repeats inside the snapshot itself.

use crate::formats::Snapshot;
use crate::graph::KnowledgeGraph;
use crate::{Entity, Relation};

/// Diagnostic counters collected during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// A snapshot file was found and parsed.
    pub snapshot_loaded: bool,
    /// A snapshot file was found but could not be parsed.
    pub snapshot_rejected: bool,
    /// Generation timestamp recorded in the snapshot.
    pub snapshot_timestamp: Option<String>,
    /// Number of delta shard files read.
    pub shard_files: usize,
    /// Entity records applied (snapshot and deltas).
    pub entities_applied: usize,
    /// Entity records that replaced an existing id.
    pub entities_overwritten: usize,
    /// Relation records appended.
    pub relations_applied: usize,
    /// Relation records dropped because their triple was already present.
    pub relations_deduplicated: usize,
    /// Delta lines skipped as malformed.
    pub lines_skipped: usize,
    /// Snapshot records skipped because they did not decode.
    pub snapshot_records_skipped: usize,
}

impl LoadReport {
    /// True when the snapshot on disk holds content that did not make it into
    /// memory. Compacting in that state would erase it.
    #[must_use]
    pub fn snapshot_incomplete(&self) -> bool {
        self.snapshot_rejected || self.snapshot_records_skipped > 0
    }
}

/// Incremental merge state. Feed the snapshot first, then deltas in order.
#[derive(Debug, Default)]
pub struct Reconciler {
    graph: KnowledgeGraph,
    report: LoadReport,
}

impl Reconciler {
    /// Start from an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a compacted snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut reconciler = Self::new();
        reconciler.report.snapshot_loaded = true;
        reconciler.report.snapshot_timestamp = snapshot.timestamp;

        for entity in snapshot.entities {
            reconciler.apply_entity(entity);
        }
        for relation in snapshot.relations {
            reconciler.apply_relation(relation);
        }
        reconciler
    }

    /// Apply an entity record; it replaces any entry with the same id.
    pub fn apply_entity(&mut self, entity: Entity) {
        self.report.entities_applied += 1;
        if self.graph.upsert_entity(entity).is_some() {
            self.report.entities_overwritten += 1;
        }
    }

    /// Apply a relation record unless its triple is already present.
    ///
    /// Returns `true` if the relation was appended.
    pub fn apply_relation(&mut self, relation: Relation) -> bool {
        let appended = self.graph.insert_relation(relation);
        if appended {
            self.report.relations_applied += 1;
        } else {
            self.report.relations_deduplicated += 1;
        }
        appended
    }

    /// Mutable access to the counters the loader maintains itself.
    pub fn report_mut(&mut self) -> &mut LoadReport {
        &mut self.report
    }

    /// Finish the merge.
    #[must_use]
    pub fn finish(self) -> (KnowledgeGraph, LoadReport) {
        (self.graph, self.report)
    }
}

/// Merge an optional snapshot with entity and relation deltas.
///
/// See the module docs for the precedence rules. Deltas are applied in the
/// iteration order given.
pub fn reconcile<E, R>(snapshot: Option<Snapshot>, entity_deltas: E, relation_deltas: R) -> KnowledgeGraph
where
    E: IntoIterator<Item = Entity>,
    R: IntoIterator<Item = Relation>,
{
    let mut reconciler = snapshot.map_or_else(Reconciler::new, Reconciler::from_snapshot);
    for entity in entity_deltas {
        reconciler.apply_entity(entity);
    }
    for relation in relation_deltas {
        reconciler.apply_relation(relation);
    }
    reconciler.finish().0
}

// =============================================================================
// TESTS
// =============================================================================
