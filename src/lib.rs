// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Cekat Nodes
//!
//! Workflow nodes for the Cekat, Power BI and WhatsApp Business Cloud REST
//! APIs. Every node is a thin adapter: read the item's parameters, build a
//! request body, call the API with the stored credential, and hand the
//! response back as the item's output.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cekat_nodes::{engine::Engine, registry, Result};
//! use cekat_nodes::auth::EnvCredentials;
//! use cekat_nodes::config::Config;
//! use cekat_nodes::dispatch::ExecutionContext;
//! use cekat_nodes::params::ItemParameters;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let node = registry::node("cekatCrm")?;
//!     let items = ItemParameters::from_json(serde_json::json!([
//!         { "resource": "lookup", "operation": "getBoards" }
//!     ]))?;
//!     let config = Config::default();
//!     let credentials = EnvCredentials::from_env();
//!
//!     let ctx = ExecutionContext::new(&items, &credentials, &config);
//!     let output = Engine::new().execute(node.as_ref(), &ctx).await?;
//!     for record in output.records {
//!         println!("{}", record.json);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                Engine (one item after another)                  │
//! │  params ─► Node::execute_item ─► OutputRecord | error record    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Dispatch │  Params   │    Columns    │   HTTP    │    Auth     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ resource │ per item  │ CRM values    │ ApiRequest│ api_key     │
//! │ :op enum │ dotted    │ by type       │ JSON/bytes│ Bearer      │
//! │          │ names     │               │ base URLs │ OAuth2      │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials and request authentication
pub mod auth;

/// HTTP request adapter
pub mod http;

/// Per-item parameter access
pub mod params;

/// CRM column value formatting
pub mod columns;

/// Configuration file
pub mod config;

/// `resource:operation` dispatch
pub mod dispatch;

/// Sequential item loop
pub mod engine;

/// Dropdown option loaders
pub mod options;

/// Webhook trigger lifecycle
pub mod trigger;

/// Cekat chat, CRM, order and AI agent nodes
pub mod cekat;

/// Power BI node
pub mod powerbi;

/// WhatsApp Business Cloud node
pub mod whatsapp;

/// Built-in nodes by type name
pub mod registry;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
