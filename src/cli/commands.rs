//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run Cekat, Power BI and WhatsApp workflow nodes from the command line
#[derive(Parser, Debug)]
#[command(name = "cekat-nodes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Credentials file (JSON object keyed by credential name)
    ///
    /// Environment variables are consulted for anything the file lacks.
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List nodes with their operations, and triggers
    List,

    /// Run a node over a JSON array of per-item parameters
    Execute {
        /// Node type name, e.g. `cekatCrm`
        #[arg(short, long)]
        node: String,

        /// Items file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        items: String,

        /// Turn failed items into error records instead of aborting
        #[arg(long)]
        continue_on_fail: bool,
    },

    /// Run a dropdown option loader
    LoadOptions {
        /// Node type name
        #[arg(short, long)]
        node: String,

        /// Loader method, e.g. `getBoards`
        #[arg(short, long)]
        method: String,

        /// Inline parameters JSON the loader reads prerequisites from
        #[arg(long)]
        params: Option<String>,
    },

    /// Receive webhooks for a trigger and print the resulting items
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Trigger type name, e.g. `cekatTrigger`
        #[arg(short, long)]
        trigger: String,

        /// Public URL the upstream API should POST to
        #[arg(long)]
        webhook_url: Option<String>,

        /// Register the webhook on start and remove it on shutdown
        #[arg(long)]
        register: bool,

        /// Inline trigger parameters JSON (events, inboxId, ...)
        #[arg(long)]
        params: Option<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
