//! Entropy analysis: the structural health report of the graph.
//!
//! ## Staleness
//!
//! Timestamps are compared as naive wall-clock readings. A value carrying a
//! UTC offset is reduced to its local reading in that offset, not converted
//! to the local zone, and compared against naive local "now". Near zone
//! boundaries this can shift the verdict by the offset difference.

use super::integrity::validate_graph;
use crate::EntropyReport;
use crate::graph::KnowledgeGraph;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta};
use std::collections::BTreeMap;

/// Naive layouts accepted after RFC 3339 has been tried.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts that RFC 3339 parsing does not cover.
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse an ISO-8601 timestamp into a naive wall-clock reading.
///
/// Returns `None` for anything unparsable, including the empty string.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Some(aware.naive_local());
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(aware) = DateTime::parse_from_str(raw, layout) {
            return Some(aware.naive_local());
        }
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Oldest timestamp still considered fresh at `now`.
fn stale_threshold(now: NaiveDateTime, stale_days: u32) -> NaiveDateTime {
    now.checked_sub_signed(TimeDelta::days(i64::from(stale_days)))
        .unwrap_or(NaiveDateTime::MIN)
}

/// True if `updated_at` is missing, unparsable, or strictly older than
/// `stale_days` before `now`.
#[must_use]
pub fn is_stale(updated_at: &str, now: NaiveDateTime, stale_days: u32) -> bool {
    match parse_timestamp(updated_at) {
        Some(ts) => ts < stale_threshold(now, stale_days),
        None => true,
    }
}

/// `edges / (n * (n - 1))` for `n > 1`, otherwise exactly `0`.
#[allow(clippy::float_arithmetic)]
#[must_use]
pub fn density(node_count: usize, edge_count: usize) -> f64 {
    if node_count <= 1 {
        return 0.0;
    }
    let n = node_count as f64;
    edge_count as f64 / (n * (n - 1.0))
}

/// Health report against the current local time.
#[must_use]
pub fn analyze_entropy(graph: &KnowledgeGraph, stale_days: u32) -> EntropyReport {
    analyze_entropy_at(graph, stale_days, Local::now().naive_local())
}

/// Health report against an explicit `now`.
#[must_use]
pub fn analyze_entropy_at(
    graph: &KnowledgeGraph,
    stale_days: u32,
    now: NaiveDateTime,
) -> EntropyReport {
    // (in, out) degree per known entity
    let mut degree: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for relation in graph.relations() {
        if graph.contains_entity(&relation.src) {
            degree.entry(relation.src.as_str()).or_default().1 += 1;
        }
        if graph.contains_entity(&relation.dst) {
            degree.entry(relation.dst.as_str()).or_default().0 += 1;
        }
    }

    let orphan_nodes = graph
        .entities()
        .filter(|e| !degree.contains_key(e.id.as_str()))
        .map(|e| e.id.clone())
        .collect();

    let stale_nodes = graph
        .entities()
        .filter(|e| is_stale(&e.updated_at, now, stale_days))
        .map(|e| e.id.clone())
        .collect();

    let total_nodes = graph.entity_count();
    let total_edges = graph.relation_count();

    EntropyReport {
        total_nodes,
        total_edges,
        orphan_nodes,
        stale_nodes,
        broken_links: validate_graph(graph),
        density: density(total_nodes, total_edges),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::float_arithmetic)]
mod tests {
    use super::*;
    use crate::storage::reconcile;
    use crate::{Entity, Relation};

    fn at(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).expect("valid timestamp")
    }

    #[test]
    fn accepted_timestamp_shapes() {
        let noon = at("2024-05-01T12:00:00");
        assert_eq!(at("2024-05-01T12:00:00.250000").date(), noon.date());
        assert_eq!(at("2024-05-01 12:00:00"), noon);
        assert_eq!(at("2024-05-01T12:00"), noon);
        assert_eq!(at("2024-05-01T12:00:00Z"), noon);
        assert_eq!(at("2024-05-01T12:00:00+09:00"), noon);
        assert_eq!(at("2024-05-01T12:00:00+0900"), noon);
        assert_eq!(at("2024-05-01"), at("2024-05-01T00:00:00"));
    }

    #[test]
    fn garbage_is_not_a_timestamp() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
    }

    #[test]
    fn staleness_boundary_is_strict() {
        let now = at("2024-05-31T00:00:00");
        assert!(!is_stale("2024-05-01T00:00:00", now, 30));
        assert!(is_stale("2024-04-30T23:59:59", now, 30));
        assert!(is_stale("", now, 30));
        assert!(is_stale("not a date", now, 30));
    }

    #[test]
    fn offset_is_not_normalised() {
        // Wall clock 00:00 at +14:00 is still read as 00:00.
        let now = at("2024-05-31T00:00:00");
        assert!(!is_stale("2024-05-01T00:00:00+14:00", now, 30));
    }

    #[test]
    fn huge_window_never_overflows() {
        let now = at("2024-05-31T00:00:00");
        assert!(!is_stale("0001-01-01", now, u32::MAX));
    }

    #[test]
    fn density_definition() {
        assert_eq!(density(0, 5), 0.0);
        assert_eq!(density(1, 3), 0.0);
        assert!((density(3, 3) - 0.5).abs() < f64::EPSILON);
        assert!((density(2, 2) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn report_counts_orphans_stale_and_broken_links() {
        let now = at("2024-06-01T00:00:00");
        let g = reconcile(
            None,
            vec![
                Entity::new("a", "t", "A", "").with_updated_at("2024-05-30T10:00:00"),
                Entity::new("b", "t", "B", "").with_updated_at("2024-01-01T00:00:00"),
                Entity::new("lonely", "t", "L", "").with_updated_at("2024-05-31"),
                Entity::new("half", "t", "H", ""),
            ],
            vec![
                Relation::new("a", "r", "b"),
                Relation::new("half", "r", "ghost"),
            ],
        );

        let report = analyze_entropy_at(&g, 30, now);
        assert_eq!(report.total_nodes, 4);
        assert_eq!(report.total_edges, 2);
        assert_eq!(report.orphan_nodes, vec!["lonely".to_string()]);
        assert_eq!(report.stale_nodes, vec!["b".to_string(), "half".to_string()]);
        assert_eq!(report.broken_links.len(), 1);
        assert!(!report.is_consistent());
        assert!((report.density - 2.0 / 12.0).abs() < f64::EPSILON);
    }
}
