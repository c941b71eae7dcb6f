//! # filewire
//!
//! A minimal stateful file-transfer protocol over a persistent TCP connection:
//! - Clients request files by name with `REQUEST` / filename lines
//! - Servers stream file contents byte-by-byte, ending each response with `0x00`
//! - Either side ends the session with `CLOSE`
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   REQUEST\n name\n    ┌──────────────────────────────┐
//! │  FileClient  │ ────────────────────▶ │  Server (accept loop)        │
//! │ (byte/line   │                       │    └─ FileServer per conn ───┼──▶ FileStore
//! │  read mode)  │ ◀──────────────────── │                              │
//! └──────┬───────┘   data* 0x00          └──────────────────────────────┘
//!        │
//!        ▼
//!  TransferObserver
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod observer;
pub mod client;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FileWireError, Result};
pub use config::{Config, ReadMode};
pub use client::{ClientState, FileClient, ReceivedFile};
pub use network::{FileServer, Server};
pub use store::{DirectoryStore, FileStore, MemoryStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of filewire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
