//! Incoming reply cleanup.

use std::borrow::Cow;

/// Trim up to two trailing CR/LF bytes from a reply.
///
/// Remote listeners commonly terminate replies with `\r\n`; the trim keeps
/// the diagnostic output clean. Only the returned slice is shortened, the
/// wire bytes are untouched.
pub fn trim_reply(reply: &[u8]) -> &[u8] {
    let mut end = reply.len();
    for _ in 0..2 {
        match reply[..end].last() {
            Some(b'\r') | Some(b'\n') => end -= 1,
            _ => break,
        }
    }
    &reply[..end]
}

/// Lossy UTF-8 display form of a trimmed reply.
pub fn reply_display(reply: &[u8]) -> Cow<'_, str> {
    match trim_reply(reply) {
        [] => Cow::Borrowed(""),
        trimmed => String::from_utf8_lossy(trimmed),
    }
}
