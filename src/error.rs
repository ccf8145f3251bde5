//! Centralized error handling for tablespec.
//!
//! Validation findings are *not* errors in this sense: a structurally broken
//! pipeline or an unknown column is reported as a list of
//! [`ValidationError`](crate::pipeline::ValidationError) values so the caller can
//! show every problem at once. [`TablespecError`] covers everything else that
//! can go wrong around those checks: reading files, decoding JSON, loading
//! settings and wiring up logging.
//!
//! ```no_run
//! use tablespec::error::{Result, ResultExt as _};
//!
//! fn read_pipeline(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read pipeline file")
//! }
//! ```

use thiserror::Error;

/// Main error type for tablespec operations.
#[derive(Debug, Error)]
pub enum TablespecError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding or encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input that could not be turned into a pipeline or a sample table
    #[error("Invalid input: {0}")]
    Input(String),

    /// Logging subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for tablespec operations.
pub type Result<T> = std::result::Result<T, TablespecError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TablespecError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: TablespecError = e.into();
            TablespecError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: TablespecError = e.into();
            TablespecError::Other(format!("{}: {}", f(), err))
        })
    }
}
