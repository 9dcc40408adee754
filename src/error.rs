//! Error types for the Cekat nodes
//!
//! This module defines the error hierarchy for every node family.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Nothing in this crate retries: every error is fatal for the item that
//! raised it, and the execution loop decides whether that aborts the batch
//! or becomes an error-shaped output record.

use thiserror::Error;

/// The main error type for the Cekat nodes
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required parameter '{name}' for item {item}")]
    MissingParameter { name: String, item: usize },

    #[error("Invalid value for parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("No credentials found for '{name}'")]
    MissingCredential { name: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("OAuth2 error: {message}")]
    OAuth2 { message: String },

    // ============================================================================
    // Lookup Errors
    // ============================================================================
    #[error("{entity} with ID {id} not found in {scope}")]
    NotFound {
        entity: String,
        id: String,
        scope: String,
    },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("{message} [{code}]{}", details_suffix(.details))]
    Upstream {
        status: u16,
        code: String,
        message: String,
        details: Option<String>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Dispatch Errors
    // ============================================================================
    #[error("No handler registered for resource:operation \"{resource}:{operation}\"")]
    UnsupportedOperation { resource: String, operation: String },

    #[error("Unknown node type: {name}")]
    UnknownNode { name: String },

    #[error("Unknown options method '{method}' for node {node}")]
    UnknownOptionsMethod { node: String, method: String },

    // ============================================================================
    // Export Errors
    // ============================================================================
    #[error("Report export failed: {message}")]
    ExportFailed { message: String },

    #[error(
        "Timeout exceeded: the export did not complete within the maximum wait time \
         ({max_wait_secs} seconds, {elapsed_secs} elapsed). Progress: {percent_complete}%"
    )]
    ExportTimeout {
        max_wait_secs: u64,
        elapsed_secs: u64,
        percent_complete: u64,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_param(name: impl Into<String>, item: usize) -> Self {
        Self::MissingParameter {
            name: name.into(),
            item,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a missing credential error
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a lookup-miss error
    pub fn not_found(
        entity: impl Into<String>,
        id: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
            scope: scope.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    /// Create an export failure error
    pub fn export_failed(message: impl Into<String>) -> Self {
        Self::ExportFailed {
            message: message.into(),
        }
    }

    /// Upstream HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } | Error::Upstream { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the error came from a configuration or parameter problem
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingParameter { .. }
                | Error::InvalidParameter { .. }
                | Error::MissingCredential { .. }
        )
    }
}

fn details_suffix(details: &Option<String>) -> String {
    details.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Result type alias for the Cekat nodes
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
