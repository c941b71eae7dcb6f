//! File Client
//!
//! Client side of the protocol: issues requests, drains responses, closes.
//!
//! ## State Machine
//! ```text
//!            request()            first byte             terminator
//!   Idle ──────────────▶ AwaitingRequestAck ─────▶ ReceivingData ─────▶ Idle
//!    │                          │ terminator (empty response)            ▲
//!    │                          └────────────────────────────────────────┘
//!    │ close()
//!    ▼
//!  Closed
//! ```
//!
//! A response must be drained to its terminator before the next request or
//! before `close()`; both are rejected with `InvalidState` otherwise.

use std::fmt::Display;
use std::net::{TcpStream, ToSocketAddrs};

use bytes::{Bytes, BytesMut};

use crate::config::{Config, ReadMode};
use crate::error::{FileWireError, Result};
use crate::observer::{LogObserver, TransferEvent, TransferObserver};
use crate::protocol::{self, Chunk, Payload, Session};

/// Where the client is in the request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No response in flight; may request or close
    Idle,

    /// Request written, nothing received yet
    AwaitingRequestAck,

    /// Payload bytes are arriving
    ReceivingData,

    /// Session closed (by us, or abandoned after a stream fault)
    Closed,
}

/// A fully drained response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    /// Requested filename
    pub name: String,

    /// Payload bytes, terminator excluded
    pub data: Bytes,

    /// CRC32 of `data`
    pub checksum: u32,
}

impl ReceivedFile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for both a missing file and an empty one; the wire can't tell them apart
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Client end of one session
pub struct FileClient {
    session: Session,
    state: ClientState,
    mode: ReadMode,
    observer: Box<dyn TransferObserver>,

    /// Filename of the response in flight, for logging
    in_flight: Option<String>,
}

impl FileClient {
    /// Connect to `host:port` with byte-mode reads and no timeouts
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_addr((host, port))
    }

    /// Connect to any socket address
    pub fn connect_addr<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(&addr)
            .map_err(|e| FileWireError::Connection(format!("{:?}: {}", addr, e)))?;
        Self::from_stream(stream, ReadMode::Byte)
    }

    /// Connect to `config.server_addr`
    ///
    /// Applies the configured read mode and timeouts.
    pub fn connect_with_config(config: &Config) -> Result<Self> {
        let stream = TcpStream::connect(config.server_addr.as_str()).map_err(|e| {
            FileWireError::Connection(format!("{}: {}", config.server_addr, e))
        })?;
        let mut client = Self::from_stream(stream, config.read_mode)?;
        client
            .session
            .set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
        Ok(client)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream, mode: ReadMode) -> Result<Self> {
        let session = Session::new(stream)
            .map_err(|e| FileWireError::Connection(format!("cannot set up session: {}", e)))?;

        tracing::debug!("Connected to {} ({:?} mode)", session.peer_addr(), mode);

        Ok(Self {
            session,
            state: ClientState::Idle,
            mode,
            observer: Box::new(LogObserver),
            in_flight: None,
        })
    }

    /// Replace the default logging observer
    pub fn with_observer(mut self, observer: impl TransferObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_read_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn read_mode(&self) -> ReadMode {
        self.mode
    }

    pub fn peer_addr(&self) -> &str {
        self.session.peer_addr()
    }

    // =========================================================================
    // Protocol Operations
    // =========================================================================

    /// Send `REQUEST` and the filename
    ///
    /// The response must then be read to its terminator with `read_byte`,
    /// `read_line`, `read_chunk` or `drain`.
    pub fn request(&mut self, filename: &str) -> Result<()> {
        if filename.is_empty() {
            return Err(FileWireError::InvalidArgument(
                "filename cannot be empty".to_string(),
            ));
        }
        if filename.contains(['\n', '\r']) {
            return Err(FileWireError::InvalidArgument(format!(
                "filename cannot contain line breaks: {:?}",
                filename
            )));
        }
        self.expect_idle("request")?;

        self.guard(|s| protocol::write_request(s.writer(), filename))?;

        self.observer
            .observe(&TransferEvent::Requested(filename.to_string()));
        self.in_flight = Some(filename.to_string());
        self.state = ClientState::AwaitingRequestAck;
        Ok(())
    }

    /// Read one byte of the response
    ///
    /// Returns the byte and whether more data follows. The flag is `false`
    /// exactly when the byte is the terminator.
    pub fn read_byte(&mut self) -> Result<(u8, bool)> {
        self.expect_in_flight()?;

        let payload = self.guard(|s| protocol::read_payload_byte(s.reader()))?;
        match payload {
            Payload::Data(b) => {
                self.observer.observe(&TransferEvent::Byte(b));
                self.state = ClientState::ReceivingData;
                Ok((b, true))
            }
            Payload::Terminator => {
                self.finish_response();
                Ok((payload.byte(), false))
            }
        }
    }

    /// Read the response up to the next `\n` or the terminator
    ///
    /// The newline is consumed and not returned. The flag is `false` when the
    /// terminator ended the line.
    pub fn read_line(&mut self) -> Result<(Vec<u8>, bool)> {
        self.expect_in_flight()?;

        let (text, more) = self.guard(|s| protocol::read_payload_line(s.reader()))?;
        if !text.is_empty() || more {
            self.observer.observe(&TransferEvent::Line {
                text: text.clone(),
                newline: more,
            });
        }

        if more {
            self.state = ClientState::ReceivingData;
        } else {
            self.finish_response();
        }
        Ok((text, more))
    }

    /// Consume one response unit according to the configured read mode
    pub fn read_chunk(&mut self) -> Result<(Chunk, bool)> {
        match self.mode {
            ReadMode::Byte => {
                let (b, more) = self.read_byte()?;
                Ok((Chunk::Byte(b), more))
            }
            ReadMode::Line => {
                let (line, more) = self.read_line()?;
                Ok((Chunk::Line(line), more))
            }
        }
    }

    /// Read the in-flight response to its terminator and return the payload
    pub fn drain(&mut self) -> Result<Bytes> {
        let mut data = BytesMut::new();
        loop {
            let (chunk, more) = self.read_chunk()?;
            data.extend_from_slice(chunk.data());
            if matches!(chunk, Chunk::Line(_)) && more {
                data.extend_from_slice(b"\n");
            }
            if !more {
                return Ok(data.freeze());
            }
        }
    }

    /// Request a file and drain the whole response
    pub fn fetch(&mut self, filename: &str) -> Result<ReceivedFile> {
        self.request(filename)?;
        let data = self.drain()?;

        if data.is_empty() {
            tracing::debug!("'{}' is empty or does not exist", filename);
        }

        let checksum = crc32fast::hash(&data);
        Ok(ReceivedFile {
            name: filename.to_string(),
            data,
            checksum,
        })
    }

    /// Send `CLOSE` and release the connection
    ///
    /// Closing an already closed client does nothing. Reads after close fail
    /// with an end-of-stream `Stream` error; requests fail with `InvalidState`.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            ClientState::Closed => return Ok(()),
            ClientState::Idle => {}
            _ => {
                return Err(FileWireError::InvalidState(format!(
                    "cannot close while the response to '{}' is in flight",
                    self.in_flight.as_deref().unwrap_or("?")
                )))
            }
        }

        let result = protocol::write_close(self.session.writer())
            .and_then(|()| self.session.shutdown());
        self.state = ClientState::Closed;
        self.observer.observe(&TransferEvent::Closed);
        tracing::debug!("Closed session with {}", self.session.peer_addr());
        result
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn expect_idle(&self, op: &str) -> Result<()> {
        match self.state {
            ClientState::Idle => Ok(()),
            ClientState::Closed => Err(FileWireError::InvalidState(format!(
                "cannot {} on a closed client",
                op
            ))),
            _ => Err(FileWireError::InvalidState(format!(
                "cannot {} while the response to '{}' is in flight",
                op,
                self.in_flight.as_deref().unwrap_or("?")
            ))),
        }
    }

    fn expect_in_flight(&self) -> Result<()> {
        match self.state {
            ClientState::AwaitingRequestAck | ClientState::ReceivingData => Ok(()),
            ClientState::Idle => Err(FileWireError::InvalidState(
                "no response in flight".to_string(),
            )),
            ClientState::Closed => Err(FileWireError::unexpected_eof(
                "reading from a closed session",
            )),
        }
    }

    /// Run a session operation; a stream fault abandons the session
    fn guard<T>(&mut self, op: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        op(&mut self.session).inspect_err(|e| {
            tracing::warn!("Session with {} failed: {}", self.session.peer_addr(), e);
            self.state = ClientState::Closed;
        })
    }

    fn finish_response(&mut self) {
        self.observer.observe(&TransferEvent::Terminator);
        if let Some(name) = self.in_flight.take() {
            tracing::debug!("Response to '{}' complete", name);
        }
        self.state = ClientState::Idle;
    }
}

impl Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClientState::Idle => "idle",
            ClientState::AwaitingRequestAck => "awaiting-request-ack",
            ClientState::ReceivingData => "receiving-data",
            ClientState::Closed => "closed",
        };
        f.write_str(name)
    }
}
