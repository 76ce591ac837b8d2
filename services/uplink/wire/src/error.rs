//! Wire codec error types.

use thiserror::Error;

/// Request/reply codec errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    /// Request does not fit the send buffer
    #[error("request exceeds send buffer capacity ({0} bytes)")]
    Capacity(usize),
}
