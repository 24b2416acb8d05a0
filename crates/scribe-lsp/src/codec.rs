//! JSON-RPC framing: `Content-Length: N\r\n\r\n{json}`.
//!
//! The header block may carry extra fields (`Content-Type` from some
//! servers); anything without a Content-Length is a protocol violation.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::SessionError;

/// Writes one framed message.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one framed message.
///
/// Returns `Ok(None)` on clean end of stream (server closed its side
/// between messages). EOF in the middle of a frame is an error.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if saw_header {
                return Err(SessionError::Protocol(
                    "stream ended inside a message header".into(),
                ));
            }
            return Ok(None);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        saw_header = true;
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                let parsed = value.trim().parse::<usize>().map_err(|_| {
                    SessionError::Protocol(format!("invalid Content-Length: {}", value.trim()))
                })?;
                content_length = Some(parsed);
            }
        } else {
            return Err(SessionError::Protocol(format!("malformed header: {line}")));
        }
    }

    let len = content_length
        .ok_or_else(|| SessionError::Protocol("missing Content-Length header".into()))?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|_| {
        SessionError::Protocol(format!("stream ended inside a {len}-byte payload"))
    })?;
    Ok(Some(payload))
}
