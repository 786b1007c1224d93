//! # Knowledge Graph
//!
//! The merged in-memory graph: an owned entity map keyed by id plus the
//! ordered relation list.
//!
//! Read access is public. Write access is crate-private and only reached
//! through two entry points: the reconciliation in [`crate::storage`] and the
//! gateway in [`crate::mutation`].

use crate::{Entity, Relation, RelationKey};
use std::collections::{BTreeMap, BTreeSet};

/// The in-memory graph.
///
/// Entities are kept in a `BTreeMap` so every listing derived from them is
/// ordered by id. Relations keep their load/append order, which is what
/// positional integrity findings refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeGraph {
    /// Entity storage: id -> Entity
    entities: BTreeMap<String, Entity>,

    /// Relations in stored order, each triple at most once.
    relations: Vec<Relation>,

    /// Seen-set of relation triples.
    relation_keys: BTreeSet<RelationKey>,
}

impl KnowledgeGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entities, ordered by id.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All relations in stored order.
    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Check if an entity id is known.
    #[must_use]
    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Check if a relation triple is already stored.
    #[must_use]
    pub fn contains_relation(&self, key: &RelationKey) -> bool {
        self.relation_keys.contains(key)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Relations leaving `id`, in stored order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.src == id)
    }

    /// Relations arriving at `id`, in stored order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.dst == id)
    }

    /// Insert or overwrite an entity. Returns the previous value, if any.
    pub(crate) fn upsert_entity(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.id.clone(), entity)
    }

    /// Append a relation unless its triple was already seen.
    ///
    /// Returns `false` (and leaves the graph untouched) for a repeated triple.
    pub(crate) fn insert_relation(&mut self, relation: Relation) -> bool {
        if !self.relation_keys.insert(relation.key()) {
            return false;
        }
        self.relations.push(relation);
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================
