//! Length-prefixed framing over a bidirectional byte stream.
//!
//! The protocol frames each JSON payload with a header block:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//! Framing sits below the dispatch core; the binary's main loop uses these
//! helpers to feed raw frames in and write queued frames out.

use std::io::{BufRead, Read, Write};

use thiserror::Error;

/// Framing failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No `Content-Length` header preceded the payload.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// A header line could not be parsed.
    #[error("invalid header format")]
    InvalidHeader,

    /// The peer closed the stream.
    #[error("stream closed")]
    Closed,
}

/// Writes one framed payload.
///
/// # Errors
///
/// Returns `TransportError::Io` when writing fails.
pub fn write_frame<W: Write>(mut writer: W, payload: &[u8]) -> Result<(), TransportError> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads one framed payload, blocking until it is complete.
///
/// Returns `Ok(None)` when the stream ends cleanly between frames.
///
/// # Errors
///
/// Returns `TransportError::MissingContentLength` when the header block
/// carries no length, `TransportError::Closed` when the stream ends inside
/// a frame, and `TransportError::Io` when reading fails.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, TransportError> {
    let length = match read_content_length(reader)? {
        Some(length) => length,
        None => return Ok(None),
    };
    let mut payload = vec![0_u8; length];
    reader
        .read_exact(&mut payload)
        .map_err(|error| match error.kind() {
            std::io::ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => TransportError::Io(error),
        })?;
    Ok(Some(payload))
}

/// Reads header lines up to the blank separator and extracts the length.
///
/// Returns `Ok(None)` on a clean end of stream before any header byte.
fn read_content_length<R: BufRead>(reader: &mut R) -> Result<Option<usize>, TransportError> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            if saw_header {
                return Err(TransportError::Closed);
            }
            return Ok(None);
        }
        saw_header = true;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length: ") {
            content_length = Some(value.parse().map_err(|_| TransportError::InvalidHeader)?);
        }
    }

    content_length
        .map(Some)
        .ok_or(TransportError::MissingContentLength)
}
