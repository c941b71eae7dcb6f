//! Response definitions
//!
//! Units a client pulls off the response stream.

use super::TERMINATOR;

/// One byte of a response: either file data or the end-of-response marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// A file byte (never 0x00)
    Data(u8),

    /// The 0x00 byte ending the response
    Terminator,
}

impl Payload {
    /// Classify a raw byte read off the stream
    pub fn from_byte(byte: u8) -> Self {
        if byte == TERMINATOR {
            Payload::Terminator
        } else {
            Payload::Data(byte)
        }
    }

    /// The raw byte as it appeared on the wire
    pub fn byte(&self) -> u8 {
        match self {
            Payload::Data(b) => *b,
            Payload::Terminator => TERMINATOR,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Payload::Terminator)
    }
}

/// One response unit as consumed by a client in a given read mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A single byte (the terminator itself in the final unit)
    Byte(u8),

    /// Bytes up to a `\n` (exclusive) or up to the terminator
    Line(Vec<u8>),
}

impl Chunk {
    /// Payload bytes carried by this chunk, excluding the terminator
    pub fn data(&self) -> &[u8] {
        match self {
            Chunk::Byte(b) if *b == TERMINATOR => &[],
            Chunk::Byte(b) => std::slice::from_ref(b),
            Chunk::Line(line) => line,
        }
    }
}
