//! CLI module
//!
//! Command-line interface for running nodes.
//!
//! # Commands
//!
//! - `list` - Nodes with their `resource:operation` keys, and triggers
//! - `execute` - Run a node over a JSON array of item parameters
//! - `load-options` - Run a dropdown option loader
//! - `serve` - Receive webhooks for a trigger

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};
