//! Error types for the setaudit library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for setaudit operations.
///
/// Lookup failures (missing sets, unresolvable ids) are not errors; they are
/// reported through plan and summary fields instead.
#[derive(Debug, Error)]
pub enum SetAuditError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error saving or loading a plan, report or snapshot.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A mutation scope could not be opened, committed or was aborted.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The model host rejected an operation.
    #[error("Host error: {0}")]
    Host(String),

    /// A requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for setaudit operations.
pub type Result<T> = std::result::Result<T, SetAuditError>;
