//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands. Each one
//! renders either human-readable text or, with `--json-mode`, one pretty
//! JSON document on stdout.

use super::CliError;
use chrono::Local;
use cortex_core::{Cortex, Entity};
use serde_json::{Value, json};

/// Characters of the description shown in search listings.
const DESC_PREVIEW_CHARS: usize = 50;

fn print_json(output: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(DESC_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show the entropy report. Fails when broken links exist.
pub fn cmd_status(cortex: &Cortex, json_mode: bool, stale_days: Option<u32>) -> Result<(), CliError> {
    let report = match stale_days {
        Some(days) => cortex.analyze_entropy_at(days, Local::now().naive_local()),
        None => cortex.analyze_entropy(),
    };

    if json_mode {
        print_json(&json!({
            "root": cortex.root().to_string_lossy(),
            "search_backend": cortex.search_backend(),
            "report": report,
        }));
    } else {
        println!("Cortex Status Report");
        println!("====================");
        println!("Root:      {}", cortex.root().display());
        println!();
        println!("Entities:  {}", report.total_nodes);
        println!("Relations: {}", report.total_edges);
        println!("Density:   {:.4}", report.density);
        println!("Orphans:   {}", report.orphan_nodes.len());
        println!("Stale:     {}", report.stale_nodes.len());

        if !report.broken_links.is_empty() {
            println!();
            println!("[!] BROKEN LINKS DETECTED: {}", report.broken_links.len());
            for finding in &report.broken_links {
                println!("  - {}", finding);
            }
        }
    }

    if report.is_consistent() {
        Ok(())
    } else {
        Err(CliError::BrokenLinks(report.broken_links.len()))
    }
}

// =============================================================================
// READ COMMANDS
// =============================================================================

/// Search entities and list the hits in rank order.
pub fn cmd_search(cortex: &Cortex, json_mode: bool, query: &str) -> Result<(), CliError> {
    let hits = cortex.search(query);

    if json_mode {
        print_json(&json!({
            "query": query,
            "count": hits.len(),
            "results": hits,
        }));
        return Ok(());
    }

    println!("Search results for '{}':", query);
    if hits.is_empty() {
        println!("  (none)");
    }
    for entity in hits {
        println!("  - [{}] {}: {}", entity.id, entity.name, preview(&entity.desc));
    }
    Ok(())
}

/// Show one entity with its incoming and outgoing connections.
pub fn cmd_get(cortex: &Cortex, json_mode: bool, id: &str) -> Result<(), CliError> {
    let view = cortex.query_entity(id);

    if json_mode {
        print_json(&json!({ "id": id, "found": view.is_some(), "result": view }));
        return Ok(());
    }

    let Some(view) = view else {
        println!("Entity '{}' not found", id);
        return Ok(());
    };

    let entity = &view.entity;
    println!("[{}] {} ({})", entity.id, entity.name, entity.kind);
    if !entity.desc.is_empty() {
        println!("  {}", entity.desc);
    }
    if !entity.tags.is_empty() {
        println!("  tags: {}", entity.tags.join(", "));
    }
    if !entity.updated_at.is_empty() {
        println!("  updated: {}", entity.updated_at);
    }
    for c in &view.connections.outgoing {
        println!("  -> {} {} ({})", c.rel, c.target, c.context);
    }
    for c in &view.connections.incoming {
        println!("  <- {} {} ({})", c.rel, c.source, c.context);
    }
    Ok(())
}

/// Print the shortest undirected connection between two entities.
pub fn cmd_path(cortex: &Cortex, json_mode: bool, start: &str, end: &str) -> Result<(), CliError> {
    let path = cortex.find_connection(start, end);

    if json_mode {
        print_json(&json!({
            "start": start,
            "end": end,
            "found": path.is_some(),
            "path": path,
        }));
        return Ok(());
    }

    match path {
        Some(path) => println!("{} ({} hops)", path.join(" -> "), path.len().saturating_sub(1)),
        None => println!("No connection between '{}' and '{}'", start, end),
    }
    Ok(())
}

/// List broken links. Fails when there are any.
pub fn cmd_validate(cortex: &Cortex, json_mode: bool) -> Result<(), CliError> {
    let findings = cortex.validate();

    if json_mode {
        print_json(&json!({ "valid": findings.is_empty(), "broken_links": findings }));
    } else if findings.is_empty() {
        println!("No broken links.");
    } else {
        for finding in &findings {
            println!("{}", finding);
        }
    }

    if findings.is_empty() {
        Ok(())
    } else {
        Err(CliError::BrokenLinks(findings.len()))
    }
}

/// Print the Mermaid diagram. Always plain text.
pub fn cmd_visualize(cortex: &Cortex) -> Result<(), CliError> {
    print!("{}", cortex.export_mermaid());
    Ok(())
}

/// Compute BLAKE3 hash of the graph content.
pub fn cmd_hash(cortex: &Cortex, json_mode: bool) -> Result<(), CliError> {
    let hash = cortex.content_hash()?;

    if json_mode {
        print_json(&json!({
            "algorithm": "blake3",
            "hash": hash,
            "entities": cortex.graph().entity_count(),
            "relations": cortex.graph().relation_count(),
        }));
    } else {
        println!("BLAKE3: {}", hash);
    }
    Ok(())
}

// =============================================================================
// WRITE COMMANDS
// =============================================================================

/// Write the snapshot file.
pub fn cmd_compact(cortex: &Cortex, json_mode: bool) -> Result<(), CliError> {
    let path = cortex.save_snapshot()?;

    if json_mode {
        print_json(&json!({
            "snapshot": path.to_string_lossy(),
            "entities": cortex.graph().entity_count(),
            "relations": cortex.graph().relation_count(),
        }));
    } else {
        println!(
            "Snapshot written to {} ({} entities, {} relations)",
            path.display(),
            cortex.graph().entity_count(),
            cortex.graph().relation_count()
        );
    }
    Ok(())
}

/// Raw `add` arguments.
#[derive(Debug, Clone)]
pub struct EntityArgs {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub desc: String,
    /// Comma-separated.
    pub tags: Option<String>,
}

impl EntityArgs {
    /// The fields document handed to the mutation gateway.
    pub fn to_fields(&self) -> Value {
        let tags: Vec<&str> = self
            .tags
            .as_deref()
            .map(|raw| raw.split(',').map(str::trim).filter(|t| !t.is_empty()).collect())
            .unwrap_or_default();
        json!({
            "id": self.id,
            "type": self.kind,
            "name": self.name,
            "desc": self.desc,
            "tags": tags,
        })
    }
}

fn report_written(json_mode: bool, kind: &str, record: &impl serde::Serialize, summary: &str) {
    if json_mode {
        print_json(&json!({ "committed": kind, "record": record }));
    } else {
        println!("Committed {}: {}", kind, summary);
    }
}

/// Add an entity to the `category` shard.
pub fn cmd_add(
    cortex: &mut Cortex,
    json_mode: bool,
    category: &str,
    args: EntityArgs,
) -> Result<(), CliError> {
    let entity: Entity = cortex.add_entity(category, &args.to_fields())?;
    report_written(json_mode, "entity", &entity, &entity.id);
    Ok(())
}

/// Add a relation to the current month's shard.
pub fn cmd_connect(
    cortex: &mut Cortex,
    json_mode: bool,
    src: &str,
    rel: &str,
    dst: &str,
    context: &str,
) -> Result<(), CliError> {
    let fields = json!({ "src": src, "rel": rel, "dst": dst, "context": context });
    let relation = cortex.add_relation(&fields)?;
    report_written(json_mode, "relation", &relation, &relation.key().to_string());
    Ok(())
}
