//! Engine types
//!
//! Configuration and statistics for the item loop.

use crate::types::OutputRecord;

/// Configuration for one execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    /// Capture a failed item as an error record and keep going
    pub continue_on_fail: bool,
}

impl ExecutionConfig {
    /// Create a new execution config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set continue-on-fail mode
    #[must_use]
    pub fn with_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }
}

impl From<&crate::config::ExecutionConfig> for ExecutionConfig {
    fn from(config: &crate::config::ExecutionConfig) -> Self {
        Self {
            continue_on_fail: config.continue_on_fail,
        }
    }
}

/// Statistics from an execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Items processed
    pub items: usize,
    /// Items whose handler succeeded
    pub succeeded: usize,
    /// Items captured as error records
    pub failed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successful item
    pub fn add_success(&mut self) {
        self.items += 1;
        self.succeeded += 1;
    }

    /// Count a captured failure
    pub fn add_failure(&mut self) {
        self.items += 1;
        self.failed += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Records produced by an execution, in input order
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    pub records: Vec<OutputRecord>,
    pub stats: ExecutionStats,
}
