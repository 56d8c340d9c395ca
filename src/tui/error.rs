//! Error types for the terminal interface

use thiserror::Error;

/// Result type for interface operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for interface operations
#[derive(Debug, Error)]
pub enum Error {
    /// Terminal I/O error
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event channel error
    #[error("event channel error: {0}")]
    Event(String),
}
