//! Protocol codec
//!
//! Framing for outgoing commands and decoding of incoming responses.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! <command text>\n
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────────────────────┬─────────────────────────────┬────┐
//! │ "<code> <len>" (padded)\n│       Body (<len> bytes)    │ \n │
//! └──────────────────────────┴─────────────────────────────┴────┘
//! ```
//!
//! The trailing newline after the body is not part of the declared length.
//! It is never consumed explicitly: the next header scan skips it as a
//! non-header line, so each read starts fresh.

use std::io::{BufRead, Read};

use bytes::BytesMut;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::Response;
use crate::error::{AdminError, Result};
use crate::network::Transport;

/// Line terminator appended to every command
pub const TERMINATOR: &[u8] = b"\n";

/// Maximum body size accepted from the server (16 MB)
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

static HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{3}) ([0-9]+)").expect("valid header pattern"));

// =============================================================================
// Command Encoding
// =============================================================================

/// Write a command to the transport
///
/// Format: text + "\n", sent as two writes
pub fn write_command<T: Transport + ?Sized>(transport: &mut T, text: &str) -> Result<()> {
    tracing::trace!("Sending command: {}", text);
    transport.write(text.as_bytes())?;
    transport.write(TERMINATOR)?;
    Ok(())
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Parse a status header line
///
/// Returns `Ok(None)` when the line is not a header.
pub fn parse_header(line: &[u8]) -> Result<Option<(u16, usize)>> {
    let caps = match HEADER_REGEX.captures(line) {
        Some(caps) => caps,
        None => return Ok(None),
    };

    // Both groups are ASCII digits, so only the numeric range can fail
    let status = parse_number::<u16>(&caps[1])?;
    let len = parse_number::<usize>(&caps[2])?;

    if len > MAX_BODY_SIZE {
        return Err(AdminError::Protocol(format!(
            "Response body too large: {} bytes (max {})",
            len, MAX_BODY_SIZE
        )));
    }

    Ok(Some((status, len)))
}

fn parse_number<T: std::str::FromStr>(digits: &[u8]) -> Result<T> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            AdminError::Protocol(format!(
                "Invalid number in status header: {}",
                String::from_utf8_lossy(digits)
            ))
        })
}

/// Read a complete response from a stream
///
/// Blocks until a header and the declared number of body bytes have been
/// read. If the stream ends before the body is complete, the bytes gathered
/// so far are returned.
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let mut line = Vec::with_capacity(64);

    // Scan for the header line
    let (status, len) = loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(AdminError::Protocol("no status header".to_string()));
        }
        if let Some(header) = parse_header(&line)? {
            break header;
        }
        tracing::trace!("Skipping non-header line ({} bytes)", line.len());
    };

    // Accumulate the body in line-sized chunks, never past the declared length
    let mut body = BytesMut::with_capacity(len);
    while body.len() < len {
        let remaining = (len - body.len()) as u64;
        line.clear();
        let read = (&mut *reader).take(remaining).read_until(b'\n', &mut line)?;
        if read == 0 {
            tracing::warn!(
                "Stream ended after {} of {} body bytes; returning truncated body",
                body.len(),
                len
            );
            break;
        }
        body.extend_from_slice(&line);
    }

    tracing::trace!("Received response {} with {} body bytes", status, body.len());

    Ok(Response::new(status, body.freeze()))
}
