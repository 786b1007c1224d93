//! # Graph Queries
//!
//! Read-only lookups over the merged graph:
//! - `find_connection`: shortest undirected path between two entities
//! - `query_entity`: one entity with its incoming and outgoing connections
//!
//! Connection finding answers "are these related at all", so every relation
//! is walked in both directions even though it is stored directed.

use crate::graph::KnowledgeGraph;
use crate::{Entity, Relation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// CONNECTION FINDING
// =============================================================================

/// Undirected adjacency in relation order.
///
/// For every relation, `dst` is pushed onto `src`'s list and `src` onto
/// `dst`'s list, for whichever endpoint is a known entity.
fn adjacency(graph: &KnowledgeGraph) -> BTreeMap<&str, Vec<&str>> {
    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for relation in graph.relations() {
        let (src, dst) = (relation.src.as_str(), relation.dst.as_str());
        if graph.contains_entity(src) {
            adjacency.entry(src).or_default().push(dst);
        }
        if graph.contains_entity(dst) {
            adjacency.entry(dst).or_default().push(src);
        }
    }
    adjacency
}

/// Shortest path (by edge count) from `start` to `end`, both inclusive.
///
/// Returns `None` if either id is unknown or the two are not connected.
/// Among equally short paths the first one discovered wins; neighbours are
/// visited in relation order, so the answer is deterministic.
#[must_use]
pub fn find_connection(graph: &KnowledgeGraph, start: &str, end: &str) -> Option<Vec<String>> {
    if !graph.contains_entity(start) || !graph.contains_entity(end) {
        return None;
    }
    if start == end {
        return Some(vec![start.to_string()]);
    }

    let adjacency = adjacency(graph);
    let mut parent: BTreeMap<&str, &str> = BTreeMap::new();
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();

    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let Some(neighbors) = adjacency.get(current) else {
            continue;
        };
        for &neighbor in neighbors {
            if !visited.insert(neighbor) {
                continue;
            }
            parent.insert(neighbor, current);
            if neighbor == end {
                return Some(unwind(&parent, start, end));
            }
            queue.push_back(neighbor);
        }
    }

    None
}

/// Walk the parent links back from `end` and reverse.
fn unwind(parent: &BTreeMap<&str, &str>, start: &str, end: &str) -> Vec<String> {
    let mut path = vec![end.to_string()];
    let mut current = end;
    while current != start {
        let Some(&previous) = parent.get(current) else {
            break;
        };
        path.push(previous.to_string());
        current = previous;
    }
    path.reverse();
    path
}

// =============================================================================
// ENTITY NEIGHBOURHOOD
// =============================================================================

/// An edge leaving the queried entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingConnection {
    pub rel: String,
    /// The `dst` of the relation.
    pub target: String,
    pub context: String,
}

/// An edge arriving at the queried entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingConnection {
    pub rel: String,
    /// The `src` of the relation.
    pub source: String,
    pub context: String,
}

impl From<&Relation> for OutgoingConnection {
    fn from(relation: &Relation) -> Self {
        Self {
            rel: relation.rel.clone(),
            target: relation.dst.clone(),
            context: relation.context.clone(),
        }
    }
}

impl From<&Relation> for IncomingConnection {
    fn from(relation: &Relation) -> Self {
        Self {
            rel: relation.rel.clone(),
            source: relation.src.clone(),
            context: relation.context.clone(),
        }
    }
}

/// Both directions, each in stored relation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Connections {
    pub outgoing: Vec<OutgoingConnection>,
    pub incoming: Vec<IncomingConnection>,
}

/// An entity together with everything it is connected to.
///
/// Serializes as `{"node": {...}, "connections": {"outgoing": [...], "incoming": [...]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityView {
    #[serde(rename = "node")]
    pub entity: Entity,
    pub connections: Connections,
}

/// Look up `id` with its connections. `None` for unknown ids.
#[must_use]
pub fn query_entity(graph: &KnowledgeGraph, id: &str) -> Option<EntityView> {
    let entity = graph.entity(id)?.clone();
    Some(EntityView {
        connections: Connections {
            outgoing: graph.outgoing(id).map(OutgoingConnection::from).collect(),
            incoming: graph.incoming(id).map(IncomingConnection::from).collect(),
        },
        entity,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::reconcile;

    fn entity(id: &str) -> Entity {
        Entity::new(id, "concept", id.to_uppercase(), "")
    }

    fn graph(ids: &[&str], edges: &[(&str, &str, &str)]) -> KnowledgeGraph {
        reconcile(
            None,
            ids.iter().map(|id| entity(id)),
            edges.iter().map(|(s, r, d)| Relation::new(*s, *r, *d)),
        )
    }

    #[test]
    fn chain_is_found() {
        let g = graph(&["a", "b", "c"], &[("a", "r", "b"), ("b", "r", "c")]);
        assert_eq!(
            find_connection(&g, "a", "c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn direction_is_ignored() {
        let g = graph(&["a", "b", "c"], &[("a", "r", "b"), ("b", "r", "c")]);
        assert_eq!(
            find_connection(&g, "c", "a"),
            Some(vec!["c".to_string(), "b".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn unknown_or_disconnected_is_none() {
        let g = graph(&["a", "b", "z"], &[("a", "r", "b")]);
        assert_eq!(find_connection(&g, "a", "d"), None);
        assert_eq!(find_connection(&g, "d", "a"), None);
        assert_eq!(find_connection(&g, "a", "z"), None);
    }

    #[test]
    fn start_equals_end() {
        let g = graph(&["a"], &[]);
        assert_eq!(find_connection(&g, "a", "a"), Some(vec!["a".to_string()]));
    }

    #[test]
    fn shortest_path_wins_and_ties_follow_relation_order() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[
                ("a", "r", "c"),
                ("a", "r", "b"),
                ("b", "r", "e"),
                ("c", "r", "e"),
                ("a", "r", "d"),
                ("d", "r", "x"),
            ],
        );
        assert_eq!(
            find_connection(&g, "a", "e"),
            Some(vec!["a".to_string(), "c".to_string(), "e".to_string()])
        );
    }

    #[test]
    fn dangling_endpoint_is_not_a_stepping_stone() {
        // Both relations touch the unknown "ghost"; a and b stay unconnected.
        let g = graph(&["a", "b"], &[("a", "r", "ghost"), ("ghost", "r", "b")]);
        assert_eq!(find_connection(&g, "a", "b"), None);
    }

    #[test]
    fn query_entity_splits_directions() {
        let g = reconcile(
            None,
            vec![entity("a"), entity("b"), entity("c")],
            vec![
                Relation::new("a", "uses", "b").with_context("paper"),
                Relation::new("c", "cites", "a"),
                Relation::new("a", "extends", "c"),
            ],
        );
        let view = query_entity(&g, "a").expect("known");
        assert_eq!(view.entity.id, "a");
        let outgoing = &view.connections.outgoing;
        let out: Vec<_> = outgoing.iter().map(|c| (c.rel.as_str(), c.target.as_str())).collect();
        assert_eq!(out, vec![("uses", "b"), ("extends", "c")]);
        assert_eq!(outgoing[0].context, "paper");
        assert_eq!(view.connections.incoming.len(), 1);
        assert_eq!(view.connections.incoming[0].source, "c");
        assert!(query_entity(&g, "missing").is_none());
    }

    #[test]
    fn entity_view_json_shape() {
        let g = reconcile(
            None,
            vec![entity("a"), entity("b")],
            vec![Relation::new("a", "uses", "b").with_context("paper")],
        );
        let json = serde_json::to_value(query_entity(&g, "b").expect("known")).expect("serialize");
        assert_eq!(json["node"]["id"], "b");
        assert_eq!(
            json["connections"]["incoming"],
            serde_json::json!([{"rel": "uses", "source": "a", "context": "paper"}])
        );
        assert_eq!(json["connections"]["outgoing"], serde_json::json!([]));

        let json = serde_json::to_value(query_entity(&g, "a").expect("known")).expect("serialize");
        assert_eq!(json["connections"]["outgoing"][0]["target"], "b");
    }
}
