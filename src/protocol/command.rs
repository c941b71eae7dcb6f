//! Command definitions
//!
//! Represents control lines sent from client to server.

use super::{CLOSE, REQUEST};

/// A parsed control line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a file request; the next line carries the filename
    Request,

    /// End the session
    Close,

    /// Any other line. Skipped by the server.
    Malformed(String),
}

impl Command {
    /// The control word as it appears on the wire (without the newline)
    pub fn as_str(&self) -> &str {
        match self {
            Command::Request => REQUEST,
            Command::Close => CLOSE,
            Command::Malformed(line) => line,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Command::Request)
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Command::Close)
    }
}
