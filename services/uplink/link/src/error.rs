//! Link driver error types.

use thiserror::Error;

/// Errors surfaced by a [`crate::LinkDriver`]
#[derive(Error, Debug)]
pub enum LinkError {
    /// No default link interface is available
    #[error("no link interface available")]
    Unavailable,
    /// Association attempt rejected with a driver status code
    #[error("association failed with status {0}")]
    Join(i32),
    /// Underlying driver I/O failure
    #[error("link driver i/o: {0}")]
    Io(#[from] std::io::Error),
}
