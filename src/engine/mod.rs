//! Execution engine module
//!
//! Runs a node over every input item, strictly one after another.
//!
//! # Overview
//!
//! - Item `k + 1` starts only after item `k` has finished, so output order
//!   always matches input order.
//! - Each item yields exactly one record.
//! - A failing item either aborts the whole execution (no output is
//!   returned) or, with continue-on-fail, becomes an error record in its
//!   slot.

mod types;

pub use types::{ExecutionConfig, ExecutionOutput, ExecutionStats};

use crate::dispatch::{ExecutionContext, Node};
use crate::error::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sequential item loop
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: ExecutionConfig,
}

impl Engine {
    /// Create a new engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Set execution configuration
    #[must_use]
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the execution configuration
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Run `node` once per input item
    pub async fn execute(&self, node: &dyn Node, ctx: &ExecutionContext<'_>) -> Result<ExecutionOutput> {
        let start = Instant::now();
        let item_count = ctx.params.item_count();
        let mut records = Vec::with_capacity(item_count);
        let mut stats = ExecutionStats::new();

        info!(node = node.name(), items = item_count, "Starting execution");

        for item in 0..item_count {
            debug!(node = node.name(), item, "Dispatching item");
            match node.execute_item(ctx, item).await {
                Ok(record) => {
                    stats.add_success();
                    records.push(record);
                }
                Err(e) if self.config.continue_on_fail => {
                    warn!(node = node.name(), item, error = %e, "Item failed, continuing");
                    stats.add_failure();
                    records.push(node.error_record(ctx, item, &e));
                }
                Err(e) => {
                    warn!(node = node.name(), item, error = %e, "Item failed, aborting execution");
                    return Err(e);
                }
            }
        }

        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            node = node.name(),
            succeeded = stats.succeeded,
            failed = stats.failed,
            duration_ms = stats.duration_ms,
            "Execution finished"
        );

        Ok(ExecutionOutput { records, stats })
    }
}
