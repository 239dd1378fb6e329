//! Session log errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session log not found: {0}")]
    NotFound(PathBuf),

    /// A line that does not decode to an event. Line numbers are 1-based.
    #[error("Malformed event on line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Session log is closed")]
    Closed,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
