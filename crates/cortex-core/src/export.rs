//! # Export Module
//!
//! Everything that turns the merged graph into a document:
//!
//! - [`save_snapshot`]: compaction, one whole-file overwrite of the snapshot
//! - [`export_mermaid`]: a Mermaid `graph TD` diagram grouped by entity type
//! - [`content_hash`]: BLAKE3 identity of the graph content (`crypto-hash`)
//!
//! Compaction never deletes delta shards. After a successful snapshot they
//! are redundant but harmless, since the merge drops what the snapshot
//! already holds.

use crate::formats::{Snapshot, snapshot_to_bytes};
use crate::graph::KnowledgeGraph;
use crate::primitives::{DIAGRAM_UNSAFE_CHARS, TIMESTAMP_FORMAT};
use crate::storage::Layout;
use crate::{CortexError, Entity};
use chrono::Local;
use std::collections::BTreeMap;
use std::path::PathBuf;

// =============================================================================
// SNAPSHOT (COMPACTION)
// =============================================================================

/// Capture the graph as a snapshot document.
#[must_use]
pub fn snapshot_of(graph: &KnowledgeGraph, timestamp: Option<String>) -> Snapshot {
    Snapshot {
        timestamp,
        entities: graph.entities().cloned().collect(),
        relations: graph.relations().to_vec(),
    }
}

/// Write the current graph to the snapshot file, replacing it.
///
/// The document is encoded completely before the file is opened. The write
/// itself is a single overwrite, not an atomic rename.
pub fn save_snapshot(layout: &Layout, graph: &KnowledgeGraph) -> Result<PathBuf, CortexError> {
    let timestamp = Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
    let bytes = snapshot_to_bytes(&snapshot_of(graph, Some(timestamp)))?;

    let path = layout.snapshot_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CortexError::io("Cannot create snapshot directory", parent, e))?;
    }
    std::fs::write(&path, &bytes).map_err(|e| CortexError::io("Cannot write snapshot", &path, e))?;

    tracing::info!(
        path = %path.display(),
        entities = graph.entity_count(),
        relations = graph.relation_count(),
        bytes = bytes.len(),
        "snapshot saved"
    );
    Ok(path)
}

// =============================================================================
// MERMAID DIAGRAM
// =============================================================================

fn diagram_label(text: &str) -> String {
    text.chars()
        .filter(|c| !DIAGRAM_UNSAFE_CHARS.contains(c))
        .collect()
}

/// Render the graph as Mermaid source.
///
/// Entities are grouped into one `subgraph` per type (types sorted, members
/// by id). Edges follow in relation order; an edge is drawn only when both
/// endpoints are known entities.
#[must_use]
pub fn export_mermaid(graph: &KnowledgeGraph) -> String {
    let mut by_type: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
    for entity in graph.entities() {
        by_type.entry(entity.kind.as_str()).or_default().push(entity);
    }

    let mut out = String::from("graph TD\n");
    for (kind, members) in &by_type {
        out.push_str(&format!("  subgraph {}\n", kind.to_uppercase()));
        for entity in members {
            out.push_str(&format!(
                "    {}(\"{}\")\n",
                entity.id,
                diagram_label(&entity.name)
            ));
        }
        out.push_str("  end\n");
    }

    for relation in graph.relations() {
        if graph.contains_entity(&relation.src) && graph.contains_entity(&relation.dst) {
            out.push_str(&format!(
                "  {} -- \"{}\" --> {}\n",
                relation.src,
                diagram_label(&relation.rel),
                relation.dst
            ));
        }
    }

    out
}

// =============================================================================
// CONTENT HASH
// =============================================================================

/// Canonical bytes of the graph content: the snapshot document without a
/// timestamp. Equal graphs give equal bytes.
pub fn canonical_payload(graph: &KnowledgeGraph) -> Result<Vec<u8>, CortexError> {
    snapshot_to_bytes(&snapshot_of(graph, None))
}

/// BLAKE3 hash of [`canonical_payload`], as 64 hex characters.
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
pub fn content_hash(graph: &KnowledgeGraph) -> Result<String, CortexError> {
    let payload = canonical_payload(graph)?;
    Ok(blake3::hash(&payload).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
