//! Power BI node
//!
//! Thin wrappers over the Power BI REST API plus the one long-running
//! operation, report export, which submits a job, polls it until it
//! reaches a terminal status and optionally downloads the file.
//!
//! ```text
//! exportToFile:  POST ExportTo ──► poll status ──► Succeeded ──► download
//!                                      │
//!                                      ├── Failed ──► ExportFailed
//!                                      └── deadline ──► ExportTimeout
//! ```

mod client;
mod export;
mod loaders;
mod node;

pub use client::{credential_name, enhance_error, extract_skip_token, group_path, PowerBiClient};
pub use export::{
    export_body, mime_type, ExportJob, ExportJobError, ExportPoller, ExportStatus, FinishedExport,
    Sleeper, TokioSleeper,
};
pub use loaders::PowerBiOptions;
pub use node::{dataflow_error, execute_queries_body, PowerBiNode, PowerBiOperation};

#[cfg(test)]
mod tests;
