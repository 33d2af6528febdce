//! Line I/O shared by both protocols.
//!
//! Replies are flushed as soon as they are written. Each connection has
//! exactly one writer, so replies leave in the order the requests came in.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Append a line terminator unless `reply` already ends with one.
///
/// An empty reply stays empty: there is nothing to send.
#[must_use]
pub fn terminate(reply: &str) -> String {
    if reply.is_empty() || reply.ends_with('\n') {
        reply.to_string()
    } else {
        format!("{reply}\r\n")
    }
}

/// Write a reply, terminated, and flush.
pub async fn write_line<W: AsyncWrite + Unpin>(stream: &mut W, reply: &str) -> std::io::Result<()> {
    let reply = terminate(reply);
    if reply.is_empty() {
        return Ok(());
    }
    stream.write_all(reply.as_bytes()).await?;
    stream.flush().await
}

/// Read one line with its terminator (`LF` or `CRLF`) removed.
///
/// Invalid UTF-8 is replaced rather than rejected. Returns `None` once
/// the peer has closed the connection.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw).await? == 0 {
        return Ok(None);
    }

    if raw.ends_with(b"\n") {
        raw.pop();
        if raw.ends_with(b"\r") {
            raw.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}
