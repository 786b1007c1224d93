//! # Property-Based Tests
//!
//! Merge and analysis invariants checked with proptest over generated
//! snapshots and delta streams.

use cortex_core::{
    Entity, KnowledgeGraph, Relation, Snapshot, analyze_entropy_at, density, find_connection,
    parse_timestamp, reconcile,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Ids from a small alphabet so collisions are common.
fn id() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e", "f", "g", "h"]).prop_map(str::to_string)
}

fn entity() -> impl Strategy<Value = Entity> {
    (id(), "[a-z]{0,6}").prop_map(|(id, name)| Entity::new(id, "concept", name, ""))
}

fn relation() -> impl Strategy<Value = Relation> {
    (id(), prop::sample::select(vec!["uses", "is_a"]), id(), "[a-z]{0,4}")
        .prop_map(|(src, rel, dst, ctx)| Relation::new(src, rel, dst).with_context(ctx))
}

fn snapshot() -> impl Strategy<Value = Snapshot> {
    (vec(entity(), 0..8), vec(relation(), 0..12)).prop_map(|(entities, relations)| Snapshot {
        timestamp: None,
        entities,
        relations,
    })
}

fn merge(snapshot: &Snapshot, entities: &[Entity], relations: &[Relation]) -> KnowledgeGraph {
    reconcile(Some(snapshot.clone()), entities.to_vec(), relations.to_vec())
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Merging the same input twice yields identical graphs.
    #[test]
    fn merge_is_idempotent(
        snap in snapshot(),
        entities in vec(entity(), 0..10),
        relations in vec(relation(), 0..15),
    ) {
        prop_assert_eq!(
            merge(&snap, &entities, &relations),
            merge(&snap, &entities, &relations)
        );
    }

    /// Every distinct triple appears exactly once, with its first payload.
    #[test]
    fn relations_are_unique_and_first_seen(
        snap in snapshot(),
        relations in vec(relation(), 0..20),
    ) {
        let graph = merge(&snap, &[], &relations);

        let mut first: BTreeMap<_, &Relation> = BTreeMap::new();
        for r in snap.relations.iter().chain(&relations) {
            first.entry(r.key()).or_insert(r);
        }

        prop_assert_eq!(graph.relation_count(), first.len());
        for r in graph.relations() {
            prop_assert_eq!(Some(&r), first.get(&r.key()));
        }
    }

    /// The last delta record for an id is what the graph holds.
    #[test]
    fn last_write_wins(
        snap in snapshot(),
        entities in vec(entity(), 1..12),
    ) {
        let graph = merge(&snap, &entities, &[]);

        let mut expected: BTreeMap<&str, &Entity> = BTreeMap::new();
        for e in snap.entities.iter().chain(&entities) {
            expected.insert(e.id.as_str(), e);
        }

        prop_assert_eq!(graph.entity_count(), expected.len());
        for (id, e) in expected {
            prop_assert_eq!(graph.entity(id), Some(e));
        }
    }

    /// Orphans are exactly the entities no relation touches.
    #[test]
    fn orphans_have_no_relations(snap in snapshot()) {
        let graph = merge(&snap, &[], &[]);
        let now = parse_timestamp("2024-01-01").expect("now");
        let report = analyze_entropy_at(&graph, 30, now);

        let touched: BTreeSet<&str> = graph
            .relations()
            .iter()
            .flat_map(|r| [r.src.as_str(), r.dst.as_str()])
            .collect();
        let orphans: BTreeSet<&str> = report.orphan_nodes.iter().map(String::as_str).collect();

        for e in graph.entities() {
            prop_assert_eq!(orphans.contains(e.id.as_str()), !touched.contains(e.id.as_str()));
        }
    }

    /// Density matches its definition and is zero for n <= 1.
    #[test]
    #[allow(clippy::float_arithmetic)]
    fn density_follows_definition(n in 0usize..200, e in 0usize..1000) {
        let d = density(n, e);
        if n <= 1 {
            prop_assert_eq!(d, 0.0);
        } else {
            let expected = e as f64 / (n as f64 * (n as f64 - 1.0));
            prop_assert!((d - expected).abs() <= f64::EPSILON * expected.max(1.0));
        }
        prop_assert!(d.is_finite());
    }

    /// A found path starts and ends where asked and only uses existing edges.
    #[test]
    fn connection_paths_are_walkable(snap in snapshot(), start in id(), end in id()) {
        let graph = merge(&snap, &[], &[]);
        if let Some(path) = find_connection(&graph, &start, &end) {
            prop_assert_eq!(path.first(), Some(&start));
            prop_assert_eq!(path.last(), Some(&end));
            for pair in path.windows(2) {
                let linked = graph.relations().iter().any(|r| {
                    (r.src == pair[0] && r.dst == pair[1]) || (r.src == pair[1] && r.dst == pair[0])
                });
                prop_assert!(linked);
            }
        }
    }
}
