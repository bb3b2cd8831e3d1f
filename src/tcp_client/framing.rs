//! Reply framing.
//!
//! Nothing on the wire marks where a reply ends, so the reader stops at the first of:
//! a complete JSON value has arrived, the peer closed the connection, or the size
//! budget is used up. Servers are free to keep the connection open after replying.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, TcpClientError};

/// What the bytes received so far amount to.
#[derive(Debug, PartialEq)]
pub(crate) enum Frame {
    /// One full JSON value, and how many bytes it spans.
    Complete(Value, usize),
    /// More bytes are needed.
    Incomplete,
    /// A syntax error before the end of the buffer; more bytes cannot fix it.
    Invalid,
}

/// Inspects the accumulated bytes without consuming them.
///
/// A top-level number only counts once something follows it: `12` may be the prefix of
/// `1234`, while `12\n` is finished.
pub(crate) fn scan(received: &[u8]) -> Frame {
    let mut values = serde_json::Deserializer::from_slice(received).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) if value.is_number() && values.byte_offset() == received.len() => Frame::Incomplete,
        Some(Ok(value)) => Frame::Complete(value, values.byte_offset()),
        None => Frame::Incomplete,
        Some(Err(err)) if err.is_eof() => Frame::Incomplete,
        Some(Err(_)) => Frame::Invalid,
    }
}

/// Tracks string and nesting state across chunks, so the full buffer is only parsed
/// again when a new chunk may have finished the top-level value.
#[derive(Debug, Default)]
pub(crate) struct Boundary {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Boundary {
    /// Feeds the next chunk. Returns `true` if any of its bytes may end a top-level value.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> bool {
        let mut may_end = false;
        for &byte in bytes {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    may_end |= self.depth == 0;
                }
                continue;
            }
            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    may_end |= self.depth == 0;
                }
                // literals, numbers, whitespace and stray bytes at the top level
                _ => may_end |= self.depth == 0,
            }
        }
        may_end
    }
}

/// Reads one reply of at most `limit` bytes, `buffer_size` bytes per receive call.
pub(crate) async fn read_response<R>(reader: &mut R, buffer_size: usize, limit: usize) -> Result<Value>
where
    R: AsyncRead + Unpin,
{
    let mut received = Vec::with_capacity(buffer_size.min(limit));
    let mut chunk = vec![0u8; buffer_size];
    let mut boundary = Boundary::default();
    let mut closed = false;

    while received.len() < limit {
        let want = buffer_size.min(limit - received.len());
        let n = reader
            .read(&mut chunk[..want])
            .await
            .map_err(TcpClientError::Transport)?;
        if n == 0 {
            log::debug!("Peer closed after {} bytes", received.len());
            closed = true;
            break;
        }
        received.extend_from_slice(&chunk[..n]);
        if !boundary.feed(&chunk[..n]) {
            continue;
        }

        match scan(&received) {
            Frame::Complete(value, consumed) => {
                let trailing = &received[consumed..];
                if trailing.iter().any(|b| !b.is_ascii_whitespace()) {
                    log::debug!("Ignoring {} bytes after the response", trailing.len());
                }
                return Ok(value);
            }
            Frame::Invalid => break,
            Frame::Incomplete => {}
        }
    }

    if received.is_empty() {
        return Err(TcpClientError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before any response bytes",
        )));
    }

    // Out of budget with the value still open: whatever parses now is a prefix.
    if !closed && scan(&received) == Frame::Incomplete {
        return Err(TcpClientError::ResponseTooLarge { limit });
    }

    serde_json::from_slice::<Value>(&received).map_err(TcpClientError::Protocol)
}
