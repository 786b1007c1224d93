//! # Substring Search
//!
//! The fallback backend. A linear scan with no state of its own, so it is
//! always available and never fails.

use super::SearchBackend;
use super::query::QueryParseError;
use crate::Entity;
use crate::graph::KnowledgeGraph;

/// Case-insensitive substring match over `id`, `name`, `desc` and `tags`,
/// plus exact `id` equality. Results are in id order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringSearch;

impl SubstringSearch {
    /// Ids of every entity matching `query`. An empty query matches all.
    pub fn scan(graph: &KnowledgeGraph, query: &str) -> Vec<String> {
        let needle = query.trim().to_lowercase();
        graph
            .entities()
            .filter(|entity| entity.id == query || entity_matches(entity, &needle))
            .map(|entity| entity.id.clone())
            .collect()
    }
}

fn entity_matches(entity: &Entity, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);
    contains(&entity.id)
        || contains(&entity.name)
        || contains(&entity.desc)
        || entity.tags.iter().any(|tag| contains(tag))
}

impl SearchBackend for SubstringSearch {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn search(&self, graph: &KnowledgeGraph, query: &str) -> Result<Vec<String>, QueryParseError> {
        Ok(Self::scan(graph, query))
    }

    fn insert(&mut self, _entity: &Entity) {}
}
