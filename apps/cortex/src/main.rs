//! # Cortex - Personal Knowledge Graph
//!
//! The command-line front end for the cortex-core engine.
//!
//! ## Usage
//!
//! ```bash
//! # Health report (exit code 1 on broken links)
//! cortex --root docs/brain status
//!
//! # Read operations
//! cortex search "rust AND NOT llm"
//! cortex path rust mcp
//! cortex visualize > brain.mmd
//!
//! # Mutations
//! cortex add concepts --id mcp --type concept --name "MCP" --desc "Model Context Protocol"
//! cortex connect rust uses mcp --context "notes/2024-02"
//! cortex compact
//! ```

use clap::Parser;
use cortex::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // CORTEX_LOG_FORMAT=json enables machine-parseable logs. Logs go to
    // stderr so command output on stdout stays pipeable.
    let log_format = std::env::var("CORTEX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cortex=info,cortex_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    // The banner would corrupt JSON on stdout.
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Cortex startup banner.
fn print_banner() {
    eprintln!(
        r#"
   ___  ___  ___  _____  ___  __  __
  / __|/ _ \| _ \|_   _|| __| \ \/ /
 | (__| (_) |   /  | |  | _|   >  <
  \___|\___/|_|_\  |_|  |___| /_/\_\

  Personal Knowledge Graph v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
