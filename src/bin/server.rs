//! filewire Server Binary
//!
//! Serves files from a directory over the filewire protocol.

use std::sync::Arc;

use clap::Parser;
use filewire::network::Server;
use filewire::{Config, DirectoryStore};
use tracing_subscriber::{fmt, EnvFilter};

/// filewire Server
#[derive(Parser, Debug)]
#[command(name = "filewire-server")]
#[command(about = "Serve files byte-by-byte over the filewire protocol")]
#[command(version)]
struct Args {
    /// Directory to serve files from
    #[arg(short, long, default_value = ".")]
    root: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:1234")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,filewire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("filewire Server v{}", filewire::VERSION);
    tracing::info!("Serving directory: {}", args.root);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .root_dir(&args.root)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let store = Arc::new(DirectoryStore::new(config.root_dir.clone()));

    let mut server = Server::new(config, store);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
