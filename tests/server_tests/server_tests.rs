//! Tests for the TCP Server (accept loop)
//!
//! These tests verify:
//! - Binding, including port 0 and bad configuration
//! - Independent concurrent sessions
//! - Connection limit
//! - Idle sessions released by the read timeout
//! - Graceful shutdown of the accept loop

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use filewire::network::{Server, ShutdownHandle};
use filewire::{Config, FileClient, FileWireError, MemoryStore, Result};

// =============================================================================
// Helper Functions
// =============================================================================

fn test_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_file("a.txt", &b"hi"[..])
            .with_file("big.bin", (1..=255u8).cycle().take(10_000).collect::<Vec<u8>>()),
    )
}

fn start_server(config: Config) -> (SocketAddr, ShutdownHandle, JoinHandle<Result<()>>) {
    let mut server = Server::new(config, test_store());
    let addr = server.bind().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run());
    (addr, shutdown, handle)
}

fn local_config() -> Config {
    Config::builder().listen_addr("127.0.0.1:0").build()
}

// =============================================================================
// Bind Tests
// =============================================================================

#[test]
fn test_bind_port_zero_reports_address() {
    let mut server = Server::new(local_config(), test_store());
    assert!(server.local_addr().is_none());

    let addr = server.bind().unwrap();
    assert_ne!(addr.port(), 0);
    assert_eq!(server.local_addr(), Some(addr));
}

#[test]
fn test_bind_invalid_config() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .max_connections(0)
        .build();
    let mut server = Server::new(config, test_store());

    assert!(matches!(server.bind(), Err(FileWireError::Config(_))));
}

#[test]
fn test_bind_address_in_use() {
    let (addr, shutdown, handle) = start_server(local_config());

    let config = Config::builder().listen_addr(addr.to_string()).build();
    let mut second = Server::new(config, test_store());
    assert!(matches!(second.bind(), Err(FileWireError::Connection(_))));

    shutdown.shutdown();
    handle.join().unwrap().unwrap();
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn test_serves_a_client() {
    let (addr, shutdown, handle) = start_server(local_config());

    let mut client = FileClient::connect("127.0.0.1", addr.port()).unwrap();
    assert_eq!(&client.fetch("a.txt").unwrap().data[..], b"hi");
    assert!(client.fetch("missing.txt").unwrap().is_empty());
    client.close().unwrap();

    shutdown.shutdown();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_concurrent_sessions_are_independent() {
    let (addr, shutdown, handle) = start_server(local_config());

    let clients: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let mut client = FileClient::connect("127.0.0.1", addr.port()).unwrap();
                for _ in 0..3 {
                    let name = if i % 2 == 0 { "big.bin" } else { "a.txt" };
                    let file = client.fetch(name).unwrap();
                    if i % 2 == 0 {
                        assert_eq!(file.len(), 10_000);
                        assert!(file.data.iter().all(|b| *b != 0));
                    } else {
                        assert_eq!(&file.data[..], b"hi");
                    }
                }
                client.close().unwrap();
            })
        })
        .collect();

    for client in clients {
        client.join().unwrap();
    }

    shutdown.shutdown();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_connection_limit_rejects_extra_clients() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .max_connections(1)
        .build();
    let (addr, shutdown, handle) = start_server(config);

    // First session is held open
    let mut first = FileClient::connect("127.0.0.1", addr.port()).unwrap();
    assert_eq!(&first.fetch("a.txt").unwrap().data[..], b"hi");

    // Second is accepted by the kernel, then dropped by the server
    let mut second = TcpStream::connect(addr).unwrap();
    second
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = [0u8; 1];
    match second.read(&mut buf) {
        Ok(n) => assert_eq!(n, 0),
        Err(e) => assert!(matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted
        )),
    }

    first.close().unwrap();
    shutdown.shutdown();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_session_ends_when_client_hangs_up() {
    let mut server = Server::new(local_config(), test_store());
    let addr = server.bind().unwrap();
    let shutdown = server.shutdown_handle();

    let mut raw = TcpStream::connect(addr).unwrap();
    raw.write_all(b"REQUEST\na.txt\n").unwrap();

    let reader = thread::spawn(move || {
        let mut response = [0u8; 3];
        raw.read_exact(&mut response).unwrap();
        assert_eq!(&response, b"hi\0");
        drop(raw);
    });

    let runner = thread::spawn(move || {
        server.run().unwrap();
        server
    });

    reader.join().unwrap();
    shutdown.shutdown();
    let server = runner.join().unwrap();

    // the session thread notices the hang-up shortly after
    let deadline = Instant::now() + Duration::from_secs(5);
    while server.active_connections() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(server.active_connections(), 0);
}

#[test]
fn test_read_timeout_releases_idle_session() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .read_timeout_ms(100)
        .build();
    let mut server = Server::new(config, test_store());
    let addr = server.bind().unwrap();
    let shutdown = server.shutdown_handle();
    let runner = thread::spawn(move || {
        server.run().unwrap();
        server
    });

    // Connected but never sends a command
    let mut idle = TcpStream::connect(addr).unwrap();

    let mut rest = Vec::new();
    idle.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());

    shutdown.shutdown();
    let server = runner.join().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while server.active_connections() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(server.active_connections(), 0);
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_shutdown_stops_accept_loop() {
    let (_addr, shutdown, handle) = start_server(local_config());

    assert!(!shutdown.is_shutdown());
    shutdown.shutdown();
    assert!(shutdown.is_shutdown());
    handle.join().unwrap().unwrap();
}
