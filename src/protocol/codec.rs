//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Control lines
//! ```text
//! ┌──────────────────────────┬──────┐
//! │  ASCII text (no "\n")    │ "\n" │
//! └──────────────────────────┴──────┘
//! ```
//! A trailing `"\r"` before the newline is tolerated on read.
//!
//! ### Payload
//! Raw bytes, one at a time, closed by a single `0x00`.

use std::io::{BufRead, Read, Write};

use super::{Command, Payload, CLOSE, REQUEST, TERMINATOR};
use crate::error::{FileWireError, Result};

/// Maximum length of a control or filename line (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

const LINE_END: u8 = b'\n';

// =============================================================================
// Command Encoding/Parsing
// =============================================================================

/// Encode a control command as a single line
pub fn encode_command(command: &Command) -> Vec<u8> {
    let word = command.as_str();
    let mut line = Vec::with_capacity(word.len() + 1);
    line.extend_from_slice(word.as_bytes());
    line.push(LINE_END);
    line
}

/// Encode a full request: the `REQUEST` line followed by the filename line
pub fn encode_request(filename: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(REQUEST.len() + filename.len() + 2);
    message.extend_from_slice(REQUEST.as_bytes());
    message.push(LINE_END);
    message.extend_from_slice(filename.as_bytes());
    message.push(LINE_END);
    message
}

/// Classify a control line (newline already stripped)
pub fn parse_command(line: &str) -> Command {
    match line {
        REQUEST => Command::Request,
        CLOSE => Command::Close,
        other => Command::Malformed(other.to_string()),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one `\n`-terminated line
///
/// Returns `None` on a clean end-of-stream before any byte. A final line
/// without a newline is returned as-is. Invalid UTF-8 is replaced lossily.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(LINE_END, &mut buf)?;

    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&LINE_END) {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_LINE_LEN {
        return Err(FileWireError::Stream(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE_LEN),
        )));
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Read a single response byte
///
/// Blocks until a byte arrives. End-of-stream here is a stream error: a
/// response is only complete once its terminator has been read.
pub fn read_payload_byte<R: Read>(reader: &mut R) -> Result<Payload> {
    let mut byte = [0u8; 1];
    match reader.read_exact(&mut byte) {
        Ok(()) => Ok(Payload::from_byte(byte[0])),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(FileWireError::unexpected_eof("reading payload"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read response bytes up to a `\n` or the terminator
///
/// Neither the newline nor the terminator is included in the returned bytes.
/// The flag is `false` when the terminator ended the line, i.e. when the
/// response is complete.
pub fn read_payload_line<R: Read>(reader: &mut R) -> Result<(Vec<u8>, bool)> {
    let mut line = Vec::new();
    loop {
        match read_payload_byte(reader)? {
            Payload::Terminator => return Ok((line, false)),
            Payload::Data(LINE_END) => return Ok((line, true)),
            Payload::Data(b) => line.push(b),
        }
    }
}

/// Write a control command and flush
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Write `REQUEST\n<filename>\n` and flush
pub fn write_request<W: Write>(writer: &mut W, filename: &str) -> Result<()> {
    writer.write_all(&encode_request(filename))?;
    writer.flush()?;
    Ok(())
}

/// Write `CLOSE\n` and flush
pub fn write_close<W: Write>(writer: &mut W) -> Result<()> {
    write_command(writer, &Command::Close)
}

/// Write one payload byte (not flushed; the terminator flushes)
pub fn write_payload_byte<W: Write>(writer: &mut W, byte: u8) -> Result<()> {
    if byte == TERMINATOR {
        return Err(FileWireError::InvalidArgument(
            "0x00 cannot be sent as payload".to_string(),
        ));
    }
    writer.write_all(&[byte])?;
    Ok(())
}

/// Write the end-of-response byte and flush
pub fn write_terminator<W: Write>(writer: &mut W) -> Result<()> {
    writer.write_all(&[TERMINATOR])?;
    writer.flush()?;
    Ok(())
}
