//! Common error types for timesheet reconciliation

use thiserror::Error;

/// Common result type for TSR operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TSR crates
///
/// Only conditions that must abort processing of a single record live here.
/// Recoverable field and consistency problems are reported as issues, not errors.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error (rosters, raw extractions)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested roster entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller broke the structural contract of a timesheet
    /// (hours array not 7 long, week not Monday..Sunday)
    #[error("Malformed timesheet structure: {0}")]
    Structure(String),
}
