//! # Search
//!
//! Two interchangeable backends behind the [`SearchBackend`] trait:
//!
//! - [`IndexedSearch`]: positional inverted index with match syntax
//! - [`SubstringSearch`]: linear scan, always available
//!
//! [`Searcher`] owns the configured primary backend and routes any query the
//! primary rejects to the substring scan. Callers never see a query error.

pub mod index;
pub mod query;
pub mod substring;

pub use index::IndexedSearch;
pub use query::{QueryExpr, QueryParseError, parse, tokenize};
pub use substring::SubstringSearch;

use crate::Entity;
use crate::graph::KnowledgeGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A search strategy over the merged graph.
pub trait SearchBackend: fmt::Debug {
    /// Short name for logs and status output.
    fn name(&self) -> &'static str;

    /// Ids of the entities matching `query`, best match first.
    ///
    /// The order must be deterministic for identical input.
    fn search(&self, graph: &KnowledgeGraph, query: &str) -> Result<Vec<String>, QueryParseError>;

    /// Keep the backend current after the gateway added `entity`.
    fn insert(&mut self, entity: &Entity);
}

/// Which backend to use as primary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Indexed,
    Substring,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Indexed => f.write_str("indexed"),
            SearchMode::Substring => f.write_str("substring"),
        }
    }
}

/// Primary backend plus the mandatory substring fallback.
#[derive(Debug)]
pub struct Searcher {
    primary: Option<Box<dyn SearchBackend>>,
    fallback: SubstringSearch,
}

impl Searcher {
    /// Build the backend selected by `mode` over `graph`.
    #[must_use]
    pub fn build(graph: &KnowledgeGraph, mode: SearchMode) -> Self {
        let primary: Option<Box<dyn SearchBackend>> = match mode {
            SearchMode::Indexed => Some(Box::new(IndexedSearch::build(graph))),
            SearchMode::Substring => None,
        };
        Self {
            primary,
            fallback: SubstringSearch,
        }
    }

    /// Name of the backend that answers well-formed queries.
    #[must_use]
    pub fn active_backend(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or_else(|| self.fallback.name(), |backend| backend.name())
    }

    /// Run `query`. Never fails: a query the primary rejects, or one it
    /// answers with no hits, is scanned as a literal substring.
    #[must_use]
    pub fn search(&self, graph: &KnowledgeGraph, query: &str) -> Vec<String> {
        if let Some(primary) = &self.primary {
            match primary.search(graph, query) {
                Ok(ids) if !ids.is_empty() => return ids,
                Ok(_) => {
                    tracing::debug!(
                        backend = primary.name(),
                        query,
                        "no hits, falling back to substring search"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        backend = primary.name(),
                        query,
                        error = %e,
                        "query rejected, falling back to substring search"
                    );
                }
            }
        }
        SubstringSearch::scan(graph, query)
    }

    /// Forward a newly added entity to the primary backend.
    pub fn insert(&mut self, entity: &Entity) {
        if let Some(primary) = &mut self.primary {
            primary.insert(entity);
        }
        self.fallback.insert(entity);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::reconcile;

    fn graph() -> KnowledgeGraph {
        reconcile(
            None,
            vec![
                Entity::new("rust", "tech", "Rust", "systems language"),
                Entity::new("go", "tech", "Go", "garbage collected language"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn indexed_is_the_default() {
        assert_eq!(SearchMode::default(), SearchMode::Indexed);
        assert_eq!(Searcher::build(&graph(), SearchMode::default()).active_backend(), "indexed");
        assert_eq!(Searcher::build(&graph(), SearchMode::Substring).active_backend(), "substring");
    }

    #[test]
    fn malformed_query_falls_back_to_substring() {
        let g = graph();
        let searcher = Searcher::build(&g, SearchMode::Indexed);
        // Unterminated quote: the index rejects it, the scan still answers.
        assert_eq!(searcher.search(&g, "\"rust"), Vec::<String>::new());
        assert_eq!(searcher.search(&g, "lang"), vec!["go", "rust"]);
        assert_eq!(searcher.search(&g, ""), vec!["go", "rust"]);
        assert_eq!(searcher.search(&g, "(language"), Vec::<String>::new());
        assert_eq!(searcher.search(&g, "AND"), Vec::<String>::new());
    }

    #[test]
    fn empty_index_result_falls_back_to_scan() {
        let g = graph();
        let index = IndexedSearch::build(&g);
        assert_eq!(index.search(&g, "ru"), Ok(Vec::new()));

        let indexed = Searcher::build(&g, SearchMode::Indexed);
        assert_eq!(indexed.search(&g, "ru"), vec!["rust"]);
        assert_eq!(indexed.search(&g, "garb"), vec!["go"]);
        // Ranked index hits are returned as-is, without a scan.
        assert_eq!(indexed.search(&g, "language"), vec!["go", "rust"]);
        // Nothing matches either way.
        assert!(indexed.search(&g, "rust AND go").is_empty());
    }

    #[test]
    fn insert_reaches_the_index() {
        let mut g = graph();
        let mut searcher = Searcher::build(&g, SearchMode::Indexed);
        let zig = Entity::new("zig", "tech", "Zig", "systems language");
        g.upsert_entity(zig.clone());
        searcher.insert(&zig);
        assert_eq!(searcher.search(&g, "systems"), vec!["rust", "zig"]);
    }

    #[test]
    fn mode_uses_lowercase_names() {
        let mode: SearchMode = serde_json::from_str("\"substring\"").expect("parse");
        assert_eq!(mode, SearchMode::Substring);
        assert_eq!(SearchMode::Indexed.to_string(), "indexed");
    }
}
