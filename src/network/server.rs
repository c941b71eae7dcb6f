//! TCP Server
//!
//! Accepts connections and runs one `FileServer` per connection on its own
//! thread. Sessions share nothing but the read-only file store.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{FileWireError, Result};
use crate::store::FileStore;

use super::FileServer;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for filewire
pub struct Server {
    config: Config,
    store: Arc<dyn FileStore>,
    listener: Option<TcpListener>,
    shutdown: ShutdownHandle,

    /// Sessions currently running
    active: Arc<AtomicUsize>,
}

/// Stops a running accept loop from another thread
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Decrements the active session count when a session thread ends
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Server {
    /// Create a new server with the given config and file store
    pub fn new(config: Config, store: Arc<dyn FileStore>) -> Self {
        Self {
            config,
            store,
            listener: None,
            shutdown: ShutdownHandle::default(),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the listening socket
    ///
    /// Called by `run` if needed; call it first to learn the address when
    /// listening on port 0.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        self.config.validate()?;

        let listener = TcpListener::bind(self.config.listen_addr.as_str()).map_err(|e| {
            FileWireError::Connection(format!("cannot listen on {}: {}", self.config.listen_addr, e))
        })?;
        // Non-blocking so the loop can notice shutdown between accepts
        listener.set_nonblocking(true)?;

        let addr = listener.local_addr()?;
        tracing::info!("Listening on {}", addr);
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Address the server is bound to, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Number of sessions currently running
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to stop accepting connections
    ///
    /// Running sessions finish on their own.
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = match self.listener.as_ref() {
            Some(listener) => listener,
            None => return Err(FileWireError::Connection("listener not bound".to_string())),
        };

        while !self.shutdown.is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => self.dispatch(stream, addr),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!(
            "Stopped accepting; {} session(s) still running",
            self.active_connections()
        );
        Ok(())
    }

    /// Hand an accepted connection to its own session thread
    fn dispatch(&self, stream: TcpStream, addr: SocketAddr) {
        if self.active_connections() >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: {} connections already active",
                addr,
                self.config.max_connections
            );
            return;
        }

        // BSD-derived platforms hand out accepted sockets in non-blocking mode
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Cannot make connection from {} blocking: {}", addr, e);
            return;
        }

        self.active.fetch_add(1, Ordering::AcqRel);
        let guard = ActiveGuard(Arc::clone(&self.active));
        let store = Arc::clone(&self.store);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("filewire-{}", addr))
            .spawn(move || {
                let _guard = guard;
                serve_connection(stream, store, read_ms, write_ms);
            });

        if let Err(e) = spawned {
            tracing::error!("Cannot spawn session thread for {}: {}", addr, e);
        }
    }
}

/// Run one session to completion, logging how it ended
fn serve_connection(stream: TcpStream, store: Arc<dyn FileStore>, read_ms: u64, write_ms: u64) {
    let mut server = match FileServer::bind(stream, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::warn!("{}", e);
            return;
        }
    };

    if let Err(e) = server.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Cannot set timeouts for {}: {}", server.peer_addr(), e);
        return;
    }

    match server.run() {
        Ok(()) => {}
        Err(e) if e.is_disconnect() => {
            tracing::debug!("Client {} went away mid-session: {}", server.peer_addr(), e);
        }
        Err(e) if e.is_timeout() => {
            tracing::debug!("Read timeout for client {}", server.peer_addr());
        }
        Err(e) => {
            tracing::warn!("Session with {} failed: {}", server.peer_addr(), e);
        }
    }
}
