//! # Cortex CLI Module
//!
//! This module implements the CLI interface for Cortex.
//!
//! ## Available Commands
//!
//! - `status` - Show the entropy report (exit code 1 on broken links)
//! - `search` - Search entities
//! - `get` - Show one entity with its connections
//! - `path` - Find the shortest connection between two entities
//! - `validate` - List broken links
//! - `visualize` - Print a Mermaid diagram
//! - `compact` - Write the snapshot
//! - `add` - Add an entity
//! - `connect` - Add a relation
//! - `hash` - Compute BLAKE3 hash of the graph content

mod commands;

use crate::config::{ConfigError, load_config};
use clap::{Parser, Subcommand};
use cortex_core::{Cortex, CortexError};
use std::path::PathBuf;
use thiserror::Error;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Cortex - personal knowledge graph
///
/// Snapshot plus append-only shards, with search, path finding and health
/// reports.
#[derive(Parser, Debug)]
#[command(name = "cortex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the brain root directory
    #[arg(short, long, global = true, default_value = "docs/brain")]
    pub root: PathBuf,

    /// Configuration file (default: <root>/cortex.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the entropy report
    Status {
        /// Override the staleness window in days
        #[arg(long)]
        stale_days: Option<u32>,
    },

    /// Search entities
    Search {
        /// Query (match syntax; falls back to substring search)
        query: String,
    },

    /// Show one entity and its connections
    Get {
        /// Entity id
        id: String,
    },

    /// Find the shortest connection between two entities
    Path {
        /// Start entity id
        start: String,
        /// End entity id
        end: String,
    },

    /// List broken links
    Validate,

    /// Print a Mermaid diagram of the graph
    Visualize,

    /// Compact the graph into the snapshot file
    Compact,

    /// Add a new entity
    Add {
        /// Category shard (e.g. 'concepts', 'tech_stack')
        category: String,
        /// Unique id slug
        #[arg(long)]
        id: String,
        /// Type (concept, tech, person, ...)
        #[arg(long = "type")]
        kind: String,
        /// Human readable name
        #[arg(long)]
        name: String,
        /// Description
        #[arg(long)]
        desc: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Connect two entities
    Connect {
        /// Source entity id
        src: String,
        /// Relation (e.g. 'uses', 'is_a')
        rel: String,
        /// Destination entity id
        dst: String,
        /// Context or source of this connection
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Compute BLAKE3 hash of the graph content
    Hash,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Anything that makes a command exit non-zero.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] CortexError),

    #[error("{0} broken link(s) detected")]
    BrokenLinks(usize),
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli.root, cli.config.as_deref())?;
    let mut cortex = Cortex::open(cli.root.clone(), config.options())?;
    let json_mode = cli.json_mode;

    if cli.verbose {
        let report = cortex.load_report();
        tracing::info!(
            root = %cortex.root().display(),
            backend = cortex.search_backend(),
            snapshot = report.snapshot_loaded,
            shards = report.shard_files,
            skipped = report.lines_skipped,
            snapshot_skipped = report.snapshot_records_skipped,
            "brain opened"
        );
    }

    match cli.command {
        Some(Commands::Status { stale_days }) => cmd_status(&cortex, json_mode, stale_days),
        Some(Commands::Search { query }) => cmd_search(&cortex, json_mode, &query),
        Some(Commands::Get { id }) => cmd_get(&cortex, json_mode, &id),
        Some(Commands::Path { start, end }) => cmd_path(&cortex, json_mode, &start, &end),
        Some(Commands::Validate) => cmd_validate(&cortex, json_mode),
        Some(Commands::Visualize) => cmd_visualize(&cortex),
        Some(Commands::Compact) => cmd_compact(&cortex, json_mode),
        Some(Commands::Add {
            category,
            id,
            kind,
            name,
            desc,
            tags,
        }) => cmd_add(
            &mut cortex,
            json_mode,
            &category,
            EntityArgs {
                id,
                kind,
                name,
                desc,
                tags,
            },
        ),
        Some(Commands::Connect {
            src,
            rel,
            dst,
            context,
        }) => cmd_connect(&mut cortex, json_mode, &src, &rel, &dst, &context),
        Some(Commands::Hash) => cmd_hash(&cortex, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&cortex, json_mode, None)
        }
    }
}
