//! # Cortex
//!
//! The engine handle: one loaded brain root with its graph and search
//! index. This is the type applications hold; it wires the storage, search,
//! query, system, export and mutation modules together.
//!
//! ```no_run
//! use cortex_core::{Cortex, CortexOptions};
//!
//! let cortex = Cortex::open("docs/brain", CortexOptions::default())?;
//! for entity in cortex.search("graph*") {
//!     println!("{} - {}", entity.id, entity.name);
//! }
//! # Ok::<(), cortex_core::CortexError>(())
//! ```

use crate::export;
use crate::graph::KnowledgeGraph;
use crate::mutation::MutationGateway;
use crate::primitives::DEFAULT_STALE_DAYS;
use crate::query::{self, EntityView};
use crate::search::{SearchMode, Searcher};
use crate::storage::{self, Layout, LoadReport};
use crate::system;
use crate::{CortexError, Entity, EntropyReport, Relation};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Engine tunables. Applications fill this from their own configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexOptions {
    /// Age in days after which an entity counts as stale.
    pub stale_days: u32,
    /// Primary search backend.
    pub search: SearchMode,
}

impl Default for CortexOptions {
    fn default() -> Self {
        Self {
            stale_days: DEFAULT_STALE_DAYS,
            search: SearchMode::default(),
        }
    }
}

/// A loaded knowledge graph.
#[derive(Debug)]
pub struct Cortex {
    layout: Layout,
    options: CortexOptions,
    graph: KnowledgeGraph,
    report: LoadReport,
    searcher: Searcher,
}

impl Cortex {
    /// Load the brain at `root`.
    ///
    /// The root directory must exist; its `knowledge` subtree may not.
    pub fn open(root: impl Into<PathBuf>, options: CortexOptions) -> Result<Self, CortexError> {
        let layout = Layout::new(root);
        if !layout.root().is_dir() {
            return Err(CortexError::IoError(format!(
                "Brain root '{}' is not a directory",
                layout.root().display()
            )));
        }

        let (graph, report) = storage::load(&layout)?;
        let searcher = Searcher::build(&graph, options.search);
        tracing::debug!(backend = searcher.active_backend(), "search ready");

        Ok(Self {
            layout,
            options,
            graph,
            report,
            searcher,
        })
    }

    /// Discard in-memory state and load again from disk.
    pub fn reload(&mut self) -> Result<(), CortexError> {
        let (graph, report) = storage::load(&self.layout)?;
        self.searcher = Searcher::build(&graph, self.options.search);
        self.graph = graph;
        self.report = report;
        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub fn options(&self) -> CortexOptions {
        self.options
    }

    #[must_use]
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Diagnostics of the last load.
    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    #[must_use]
    pub fn search_backend(&self) -> &'static str {
        self.searcher.active_backend()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Entities matching `query`, best match first. Never fails.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Entity> {
        self.searcher
            .search(&self.graph, query)
            .iter()
            .filter_map(|id| self.graph.entity(id))
            .collect()
    }

    #[must_use]
    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.graph.entity(id)
    }

    #[must_use]
    pub fn query_entity(&self, id: &str) -> Option<EntityView> {
        query::query_entity(&self.graph, id)
    }

    #[must_use]
    pub fn find_connection(&self, start: &str, end: &str) -> Option<Vec<String>> {
        query::find_connection(&self.graph, start, end)
    }

    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        system::validate_graph(&self.graph)
    }

    /// Health report with the configured staleness window.
    #[must_use]
    pub fn analyze_entropy(&self) -> EntropyReport {
        system::analyze_entropy(&self.graph, self.options.stale_days)
    }

    /// Health report with an explicit window and clock.
    #[must_use]
    pub fn analyze_entropy_at(&self, stale_days: u32, now: NaiveDateTime) -> EntropyReport {
        system::analyze_entropy_at(&self.graph, stale_days, now)
    }

    #[must_use]
    pub fn export_mermaid(&self) -> String {
        export::export_mermaid(&self.graph)
    }

    #[cfg(feature = "crypto-hash")]
    pub fn content_hash(&self) -> Result<String, CortexError> {
        export::content_hash(&self.graph)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Compact the current graph into the snapshot file.
    ///
    /// Fails with [`CortexError::IncompleteSnapshot`] when the snapshot read at
    /// load time was rejected or had records skipped.
    pub fn save_snapshot(&self) -> Result<PathBuf, CortexError> {
        if self.report.snapshot_incomplete() {
            let path = self.layout.snapshot_path();
            tracing::warn!(
                path = %path.display(),
                rejected = self.report.snapshot_rejected,
                skipped = self.report.snapshot_records_skipped,
                "compaction refused"
            );
            return Err(CortexError::IncompleteSnapshot(path.display().to_string()));
        }
        export::save_snapshot(&self.layout, &self.graph)
    }

    /// Add an entity through the mutation gateway.
    pub fn add_entity(&mut self, category: &str, fields: &Value) -> Result<Entity, CortexError> {
        MutationGateway::add_entity(
            &self.layout,
            &mut self.graph,
            &mut self.searcher,
            category,
            fields,
            Local::now().naive_local(),
        )
    }

    /// Add a relation through the mutation gateway.
    pub fn add_relation(&mut self, fields: &Value) -> Result<Relation, CortexError> {
        MutationGateway::add_relation(
            &self.layout,
            &mut self.graph,
            fields,
            Local::now().naive_local(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
