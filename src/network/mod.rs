//! Network Module
//!
//! TCP server and per-connection protocol handling.
//!
//! ## Architecture
//! - Single acceptor thread (`Server::run`)
//! - One thread per connection running a `FileServer`
//! - File lookups go through a shared, read-only `FileStore`

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{FileServer, Resolution, ServerState};
