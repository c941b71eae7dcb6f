//! Protocol Module
//!
//! Defines the wire protocol spoken between file client and file server.
//!
//! ## Protocol Format
//!
//! Control words and filenames are `\n`-terminated ASCII lines. File contents
//! travel as raw single bytes with no length prefix; a single `0x00` byte
//! marks the end of each response.
//!
//! ### Request
//! ```text
//! ┌──────────────┬──────────────────────┐
//! │ "REQUEST\n"  │   <filename> "\n"    │
//! └──────────────┴──────────────────────┘
//! ```
//!
//! ### Response
//! ```text
//! ┌──────┬──────┬─────┬──────┬──────────┐
//! │ data │ data │ ... │ data │   0x00   │
//! └──────┴──────┴─────┴──────┴──────────┘
//!   each data byte is in 0x01..=0xFF
//! ```
//!
//! ### Close
//! ```text
//! ┌──────────────┐
//! │  "CLOSE\n"   │
//! └──────────────┘
//! ```
//!
//! A missing file and an empty file produce the same response: just the
//! terminator. A payload byte of `0x00` cannot be expressed.

mod command;
mod response;
mod codec;
mod session;

pub use command::Command;
pub use response::{Chunk, Payload};
pub use codec::{
    encode_command, encode_request, parse_command, read_line, read_payload_byte,
    read_payload_line, write_close, write_command, write_payload_byte, write_request,
    write_terminator, MAX_LINE_LEN,
};
pub use session::Session;

/// Default TCP port for the protocol
pub const DEFAULT_PORT: u16 = 1234;

/// Byte that ends every response
pub const TERMINATOR: u8 = 0x00;

/// Control word that starts a file request
pub const REQUEST: &str = "REQUEST";

/// Control word that ends a session
pub const CLOSE: &str = "CLOSE";
