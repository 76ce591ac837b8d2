//! Outgoing request encoding.

use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, Write};

use crate::error::WireError;

/// Request tag carried as the first token of every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Fixed-cadence request fired by the scheduler.
    Periodic,
    /// Out-of-cycle request fired by the external trigger bridge.
    Manual,
}

impl Tag {
    /// Wire literal for this tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Tag::Periodic => "test",
            Tag::Manual => "btn",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode `"<tag> <counter>\r"` into `buf`, returning the encoded length.
///
/// `buf` is the caller's reused fixed-capacity send buffer. The bytes up
/// to the returned length must be fully transmitted before the buffer is
/// reused.
pub fn encode_request(tag: Tag, counter: u64, buf: &mut [u8]) -> Result<usize, WireError> {
    let capacity = buf.len();
    let mut cursor = Cursor::new(buf);
    write!(cursor, "{} {}\r", tag.as_str(), counter).map_err(|_| WireError::Capacity(capacity))?;
    Ok(cursor.position() as usize)
}

/// Display form of an encoded request: the wire bytes minus the trailing CR.
///
/// The delimiter is stripped from the display copy only, never from the
/// wire bytes.
pub fn request_display(encoded: &[u8]) -> Cow<'_, str> {
    let body = encoded.strip_suffix(b"\r").unwrap_or(encoded);
    String::from_utf8_lossy(body)
}
