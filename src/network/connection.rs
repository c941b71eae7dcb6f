//! Connection Handler
//!
//! Server side of the protocol for one accepted connection.
//!
//! ## State Machine
//! ```text
//!                  REQUEST                    found
//!  AwaitingCommand ───────▶ ParsingFilename ───────▶ StreamingFile ───┐
//!     ▲    │                       │ not found                        │
//!     │    │ CLOSE                 └───────────▶ StreamingAbsence ────┤
//!     │    ▼                                                          │
//!     │  Closed                                         terminator    │
//!     └───────────────────────────────────────────────────────────────┘
//! ```

use std::net::TcpStream;
use std::sync::Arc;

use crate::error::{FileWireError, Result};
use crate::protocol::{self, Command, Session, TERMINATOR};
use crate::store::{FileHandle, FileStore};

/// Where the server is in the command cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    AwaitingCommand,
    ParsingFilename,
    StreamingFile,
    StreamingAbsence,
    Closed,
}

/// Outcome of looking up a requested filename
#[derive(Debug)]
pub enum Resolution {
    Found(FileHandle),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Serves file requests on a single connection
pub struct FileServer {
    session: Session,
    state: ServerState,
    store: Arc<dyn FileStore>,

    /// Last command read, consulted by `await_close`
    last_command: Option<Command>,
}

impl FileServer {
    /// Adopt an accepted connection
    pub fn bind(stream: TcpStream, store: Arc<dyn FileStore>) -> Result<Self> {
        let session = Session::new(stream)
            .map_err(|e| FileWireError::Bind(format!("cannot obtain stream endpoints: {}", e)))?;

        Ok(Self {
            session,
            state: ServerState::AwaitingCommand,
            store,
            last_command: None,
        })
    }

    /// Configure connection timeouts (0 leaves reads/writes blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.session.set_timeouts(read_ms, write_ms)
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn peer_addr(&self) -> &str {
        self.session.peer_addr()
    }

    /// Serve requests until the peer closes (blocking)
    ///
    /// Every `REQUEST` is answered completely, terminator included, before the
    /// next command is read. Unrecognised lines are skipped. A peer that hangs
    /// up without `CLOSE` ends the session quietly.
    pub fn run(&mut self) -> Result<()> {
        tracing::debug!("File server started for {}", self.peer_addr());

        while !self.await_close() {
            let command = match self.next_command()? {
                Some(command) => command,
                None => {
                    tracing::debug!("Client {} disconnected without CLOSE", self.peer_addr());
                    break;
                }
            };

            match command {
                Command::Close => {
                    tracing::debug!("Client {} sent CLOSE", self.peer_addr());
                }
                Command::Request => {
                    tracing::debug!("File server has request from {}", self.peer_addr());
                    let filename = self.read_filename()?;
                    tracing::debug!("File server has filename: {}", filename);

                    let resolution = self.resolve_file(&filename)?;
                    if resolution.is_found() {
                        let sent = self.stream_file(resolution)?;
                        tracing::debug!("File '{}' sent ({} bytes)", filename, sent);
                    } else {
                        self.stream_file(resolution)?;
                        tracing::debug!("File '{}' does not exist", filename);
                    }
                    self.send_terminator()?;
                }
                Command::Malformed(line) => {
                    tracing::warn!(
                        "Ignoring unrecognised line from {}: {:?}",
                        self.peer_addr(),
                        line
                    );
                }
            }
        }

        self.close()?;
        tracing::debug!("File server closed for {}", self.peer_addr());
        Ok(())
    }

    // =========================================================================
    // Protocol Operations
    // =========================================================================

    /// Read and classify one control line
    ///
    /// Returns `None` when the peer closed the stream.
    pub fn next_command(&mut self) -> Result<Option<Command>> {
        self.state = ServerState::AwaitingCommand;

        let Some(line) = protocol::read_line(self.session.reader())? else {
            return Ok(None);
        };

        let command = protocol::parse_command(&line);
        tracing::trace!("Received command from {}: {:?}", self.peer_addr(), command);

        if command.is_request() {
            self.state = ServerState::ParsingFilename;
        }
        self.last_command = Some(command.clone());
        Ok(Some(command))
    }

    /// Read the filename line that follows `REQUEST`
    ///
    /// Empty lines are skipped; each attempt blocks on the stream. The stream
    /// ending here is an error since the request can never be answered.
    pub fn read_filename(&mut self) -> Result<String> {
        loop {
            match protocol::read_line(self.session.reader())? {
                Some(name) if name.is_empty() => continue,
                Some(name) => return Ok(name),
                None => return Err(FileWireError::unexpected_eof("waiting for filename")),
            }
        }
    }

    /// Look up a requested file; absence is not an error
    pub fn resolve_file(&mut self, filename: &str) -> Result<Resolution> {
        match self.store.open(filename)? {
            Some(handle) => {
                self.state = ServerState::StreamingFile;
                Ok(Resolution::Found(handle))
            }
            None => {
                self.state = ServerState::StreamingAbsence;
                Ok(Resolution::NotFound)
            }
        }
    }

    /// Write the file's bytes, one at a time, until end-of-file
    ///
    /// Writes nothing for `NotFound`. A 0x00 byte in the file would read as the
    /// end of the response, so such bytes are skipped and counted. Returns
    /// the number of payload bytes written.
    pub fn stream_file(&mut self, resolution: Resolution) -> Result<u64> {
        let Resolution::Found(mut handle) = resolution else {
            return Ok(0);
        };

        let mut sent = 0u64;
        let mut skipped = 0u64;
        while let Some(byte) = handle.read_byte()? {
            if byte == TERMINATOR {
                skipped += 1;
                continue;
            }
            tracing::trace!("Sending byte: {:?} (0x{:02x})", char::from(byte), byte);
            protocol::write_payload_byte(self.session.writer(), byte)?;
            sent += 1;
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} zero byte(s) in '{}': not representable on the wire",
                skipped,
                handle.name()
            );
        }
        handle.close();
        Ok(sent)
    }

    /// Write the end-of-response byte; always follows a transfer attempt
    pub fn send_terminator(&mut self) -> Result<()> {
        protocol::write_terminator(self.session.writer())?;
        self.state = ServerState::AwaitingCommand;
        Ok(())
    }

    /// Whether the last command read was `CLOSE`
    pub fn await_close(&self) -> bool {
        matches!(self.last_command, Some(Command::Close))
    }

    /// Release both halves of the connection
    pub fn close(&mut self) -> Result<()> {
        if self.state == ServerState::Closed {
            return Ok(());
        }
        self.state = ServerState::Closed;
        self.session.shutdown()
    }
}
