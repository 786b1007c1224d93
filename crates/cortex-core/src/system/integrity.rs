//! Referential integrity of the relation list.

use crate::Endpoint;
use crate::graph::KnowledgeGraph;

/// Describe every relation endpoint that does not name a known entity.
///
/// Relations are checked in stored order, source before destination, and
/// each finding carries the relation's position in the list.
#[must_use]
pub fn validate_graph(graph: &KnowledgeGraph) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, relation) in graph.relations().iter().enumerate() {
        if !graph.contains_entity(&relation.src) {
            errors.push(broken_link(index, Endpoint::Source, &relation.src));
        }
        if !graph.contains_entity(&relation.dst) {
            errors.push(broken_link(index, Endpoint::Destination, &relation.dst));
        }
    }
    errors
}

fn broken_link(index: usize, endpoint: Endpoint, id: &str) -> String {
    let side = match endpoint {
        Endpoint::Source => "source",
        Endpoint::Destination => "destination",
    };
    format!(
        "Broken Link: Relation #{} {} '{}' does not exist.",
        index, side, id
    )
}
