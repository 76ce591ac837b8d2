//! Request/reply text codec for the uplink client.
//!
//! The wire format is deliberately small: a request is ASCII
//! `"<tag> <decimal-counter>\r"` with no length prefix; the trailing
//! carriage return is the delimiter and stays on the wire. Replies are
//! ASCII text, trimmed of at most two trailing CR/LF bytes for display
//! only.
//!
//! Encoding writes into the caller's reused fixed-capacity send buffer;
//! nothing here allocates per transaction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod reply;
pub mod request;

pub use error::WireError;
pub use reply::{reply_display, trim_reply};
pub use request::{encode_request, request_display, Tag};
