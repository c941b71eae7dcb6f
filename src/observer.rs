//! Transfer observers
//!
//! Every unit a client pulls off the wire is reported to an observer.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

/// Something the client saw or did on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// A request for this filename was written
    Requested(String),

    /// A payload byte arrived
    Byte(u8),

    /// A payload line arrived; `newline` is set when a `\n` ended it
    Line { text: Vec<u8>, newline: bool },

    /// The end-of-response byte arrived
    Terminator,

    /// The session was closed
    Closed,
}

/// Receives transfer events from a client
pub trait TransferObserver: Send {
    fn observe(&mut self, event: &TransferEvent);
}

// =============================================================================
// LogObserver
// =============================================================================

/// Reports events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl TransferObserver for LogObserver {
    fn observe(&mut self, event: &TransferEvent) {
        match event {
            TransferEvent::Requested(name) => tracing::debug!("Requesting file: {}", name),
            TransferEvent::Byte(b) => {
                tracing::trace!("Received byte: {:?} (0x{:02x})", char::from(*b), b)
            }
            TransferEvent::Line { text, .. } => {
                tracing::trace!("Received line: {}", String::from_utf8_lossy(text))
            }
            TransferEvent::Terminator => tracing::trace!("Received terminator"),
            TransferEvent::Closed => tracing::debug!("Session closed"),
        }
    }
}

// =============================================================================
// RecordingObserver
// =============================================================================

#[derive(Default)]
struct Recording {
    data: BytesMut,
    events: Vec<TransferEvent>,
}

/// Buffers payload bytes and events; clones share the same buffer
#[derive(Clone, Default)]
pub struct RecordingObserver {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All payload bytes received so far, across responses
    pub fn data(&self) -> Bytes {
        Bytes::copy_from_slice(&self.inner.lock().data)
    }

    /// Take the buffered payload bytes, leaving the buffer empty
    pub fn take_data(&self) -> Bytes {
        self.inner.lock().data.split().freeze()
    }

    /// Every event seen so far
    pub fn events(&self) -> Vec<TransferEvent> {
        self.inner.lock().events.clone()
    }

    /// Number of terminators seen, i.e. completed responses
    pub fn responses(&self) -> usize {
        self.inner
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, TransferEvent::Terminator))
            .count()
    }
}

impl TransferObserver for RecordingObserver {
    fn observe(&mut self, event: &TransferEvent) {
        let mut recording = self.inner.lock();
        match event {
            TransferEvent::Byte(b) => recording.data.extend_from_slice(&[*b]),
            TransferEvent::Line { text, newline } => {
                recording.data.extend_from_slice(text);
                if *newline {
                    recording.data.extend_from_slice(b"\n");
                }
            }
            _ => {}
        }
        recording.events.push(event.clone());
    }
}

// =============================================================================
// ChannelObserver
// =============================================================================

/// Forwards events over a crossbeam channel
#[derive(Clone)]
pub struct ChannelObserver {
    tx: Sender<TransferEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its unbounded channel
    pub fn channel() -> (Self, Receiver<TransferEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }
}

impl TransferObserver for ChannelObserver {
    fn observe(&mut self, event: &TransferEvent) {
        // Nobody listening is fine; the transfer carries on
        let _ = self.tx.send(event.clone());
    }
}
