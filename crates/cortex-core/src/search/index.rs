//! # Inverted Index
//!
//! Positional inverted index over `id`, `name`, `desc` and `tags`, evaluated
//! with the match syntax from [`super::query`].
//!
//! Scores are integer term frequencies; results are ordered by score
//! (descending) and then by entity id, so equal input always gives equal
//! output.

use super::SearchBackend;
use super::query::{QueryExpr, QueryParseError, parse, tokenize};
use crate::Entity;
use crate::graph::KnowledgeGraph;
use std::collections::{BTreeMap, BTreeSet};

/// Position gap inserted between fields so phrases never span two fields.
const FIELD_GAP: u32 = 1;

/// token -> entity id -> positions
type Postings = BTreeMap<String, BTreeMap<String, Vec<u32>>>;

/// entity id -> score
type Scores = BTreeMap<String, u32>;

/// The primary search backend.
#[derive(Debug, Clone, Default)]
pub struct IndexedSearch {
    postings: Postings,
    /// Distinct tokens of each document, for re-indexing and `NOT`.
    documents: BTreeMap<String, BTreeSet<String>>,
}

impl IndexedSearch {
    /// Index every entity of the graph.
    #[must_use]
    pub fn build(graph: &KnowledgeGraph) -> Self {
        let mut index = Self::default();
        for entity in graph.entities() {
            index.index_entity(entity);
        }
        tracing::debug!(
            documents = index.documents.len(),
            terms = index.postings.len(),
            "search index built"
        );
        index
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn index_entity(&mut self, entity: &Entity) {
        self.remove(&entity.id);

        let fields = [&entity.id, &entity.name, &entity.desc]
            .into_iter()
            .chain(entity.tags.iter());

        let mut position: u32 = 0;
        let mut distinct = BTreeSet::new();
        for field in fields {
            for token in tokenize(field) {
                self.postings
                    .entry(token.clone())
                    .or_default()
                    .entry(entity.id.clone())
                    .or_default()
                    .push(position);
                distinct.insert(token);
                position = position.saturating_add(1);
            }
            position = position.saturating_add(FIELD_GAP);
        }

        self.documents.insert(entity.id.clone(), distinct);
    }

    fn remove(&mut self, id: &str) {
        let Some(tokens) = self.documents.remove(id) else {
            return;
        };
        for token in tokens {
            if let Some(docs) = self.postings.get_mut(&token) {
                docs.remove(id);
                if docs.is_empty() {
                    self.postings.remove(&token);
                }
            }
        }
    }

    fn evaluate(&self, expr: &QueryExpr) -> Scores {
        match expr {
            QueryExpr::Term(term) => self
                .postings
                .get(term)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, positions)| (id.clone(), positions.len() as u32))
                        .collect()
                })
                .unwrap_or_default(),

            QueryExpr::Prefix(prefix) => {
                let mut scores = Scores::new();
                let matching = self
                    .postings
                    .range(prefix.clone()..)
                    .take_while(|(token, _)| token.starts_with(prefix.as_str()));
                for (_, docs) in matching {
                    for (id, positions) in docs {
                        *scores.entry(id.clone()).or_default() += positions.len() as u32;
                    }
                }
                scores
            }

            QueryExpr::Phrase(terms) => self.evaluate_phrase(terms),

            QueryExpr::And(parts) => {
                let mut iter = parts.iter();
                let Some(first) = iter.next() else {
                    return Scores::new();
                };
                let mut acc = self.evaluate(first);
                for part in iter {
                    if acc.is_empty() {
                        break;
                    }
                    let next = self.evaluate(part);
                    acc = acc
                        .into_iter()
                        .filter_map(|(id, score)| next.get(&id).map(|s| (id, score + s)))
                        .collect();
                }
                acc
            }

            QueryExpr::Or(branches) => {
                let mut acc = Scores::new();
                for branch in branches {
                    for (id, score) in self.evaluate(branch) {
                        *acc.entry(id).or_default() += score;
                    }
                }
                acc
            }

            QueryExpr::Not(inner) => {
                let excluded = self.evaluate(inner);
                self.documents
                    .keys()
                    .filter(|id| !excluded.contains_key(*id))
                    .map(|id| (id.clone(), 0))
                    .collect()
            }
        }
    }

    /// Documents where `terms` occur at consecutive positions.
    fn evaluate_phrase(&self, terms: &[String]) -> Scores {
        let mut lists = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings.get(term) {
                Some(docs) => lists.push(docs),
                None => return Scores::new(),
            }
        }
        let Some((head, tail)) = lists.split_first() else {
            return Scores::new();
        };

        let mut scores = Scores::new();
        for (id, starts) in head.iter() {
            let hits = starts
                .iter()
                .filter(|&&start| {
                    tail.iter().enumerate().all(|(offset, docs)| {
                        let wanted = start.saturating_add(offset as u32 + 1);
                        docs.get(id)
                            .is_some_and(|positions| positions.binary_search(&wanted).is_ok())
                    })
                })
                .count();
            if hits > 0 {
                scores.insert(id.clone(), hits as u32);
            }
        }
        scores
    }
}

impl SearchBackend for IndexedSearch {
    fn name(&self) -> &'static str {
        "indexed"
    }

    fn search(&self, _graph: &KnowledgeGraph, query: &str) -> Result<Vec<String>, QueryParseError> {
        let expr = parse(query)?;
        let mut ranked: Vec<(String, u32)> = self.evaluate(&expr).into_iter().collect();
        // BTreeMap iteration is id-ordered and the sort is stable,
        // so equal scores stay in id order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(ranked.into_iter().map(|(id, _)| id).collect())
    }

    fn insert(&mut self, entity: &Entity) {
        self.index_entity(entity);
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
                Entity::new("mcp", "tech", "Model Context Protocol", "tool calling protocol")
                    .with_tags(["protocol", "llm"]),
                Entity::new("rust", "tech", "Rust", "systems language").with_tags(["lang"]),
                Entity::new("graph-db", "concept", "Graph Database", "stores nodes and edges"),
                Entity::new("kg", "concept", "Knowledge Graph", "a graph of knowledge")
                    .with_tags(["graph"]),
            ],
            Vec::new(),
        )
    }

    fn search(index: &IndexedSearch, query: &str) -> Vec<String> {
        index.search(&graph(), query).expect("query parses")
    }

    #[test]
    fn single_term_ranks_by_frequency_then_id() {
        let index = IndexedSearch::build(&graph());
        // "kg" mentions graph three times (name, desc, tag), "graph-db" twice (id, name).
        assert_eq!(search(&index, "graph"), vec!["kg", "graph-db"]);
    }

    #[test]
    fn terms_are_case_insensitive() {
        let index = IndexedSearch::build(&graph());
        assert_eq!(search(&index, "RUST"), vec!["rust"]);
    }

    #[test]
    fn phrase_requires_adjacency() {
        let index = IndexedSearch::build(&graph());
        assert_eq!(search(&index, "\"context protocol\""), vec!["mcp"]);
        assert!(search(&index, "\"protocol context\"").is_empty());
    }

    #[test]
    fn phrase_does_not_span_fields() {
        let index = IndexedSearch::build(&graph());
        // name ends with "Rust", desc starts with "systems".
        assert!(search(&index, "\"rust systems\"").is_empty());
    }

    #[test]
    fn prefix_and_boolean_operators() {
        let index = IndexedSearch::build(&graph());
        assert_eq!(search(&index, "know*"), vec!["kg"]);
        assert_eq!(search(&index, "rust OR llm"), vec!["rust", "mcp"]);
        assert_eq!(search(&index, "graph NOT knowledge"), vec!["graph-db"]);
        assert_eq!(search(&index, "protocol llm"), vec!["mcp"]);
    }

    #[test]
    fn insert_makes_new_entity_searchable() {
        let mut index = IndexedSearch::build(&graph());
        index.insert(&Entity::new("tokio", "tech", "Tokio", "async runtime"));
        assert_eq!(search(&index, "runtime"), vec!["tokio"]);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn reinserting_replaces_old_terms() {
        let mut index = IndexedSearch::build(&graph());
        index.insert(&Entity::new("rust", "tech", "Rust", "memory safety"));
        assert!(search(&index, "systems").is_empty());
        assert_eq!(search(&index, "safety"), vec!["rust"]);
    }

    #[test]
    fn unparsable_query_is_an_error() {
        let index = IndexedSearch::build(&graph());
        assert!(index.search(&graph(), "\"unterminated").is_err());
    }
}
