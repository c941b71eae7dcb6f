//! Error types for filewire
//!
//! Provides a unified error type for client, server and dispatcher operations.

use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias using FileWireError
pub type Result<T> = std::result::Result<T, FileWireError>;

/// Unified error type for filewire operations
#[derive(Debug, Error)]
pub enum FileWireError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Usage Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // -------------------------------------------------------------------------
    // File Access Errors
    // -------------------------------------------------------------------------
    #[error("File access error on {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FileWireError {
    /// Whether this error means the peer went away (EOF, reset, abort, broken pipe)
    pub fn is_disconnect(&self) -> bool {
        match self {
            FileWireError::Stream(e) => matches!(
                e.kind(),
                ErrorKind::UnexpectedEof
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// Whether this error is a read/write timeout on the connection
    ///
    /// Unix reports `WouldBlock`, Windows reports `TimedOut`.
    pub fn is_timeout(&self) -> bool {
        match self {
            FileWireError::Stream(e) => {
                matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
            }
            _ => false,
        }
    }

    /// Error for a stream that ended where the protocol requires more bytes
    pub(crate) fn unexpected_eof(context: &str) -> Self {
        FileWireError::Stream(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("stream closed while {}", context),
        ))
    }
}
