//! filewire Client Binary
//!
//! Requests files from a filewire server, one after another on one session.

use std::path::PathBuf;

use clap::Parser;
use filewire::{Config, FileClient, ReadMode};
use tracing_subscriber::{fmt, EnvFilter};

/// filewire Client
#[derive(Parser, Debug)]
#[command(name = "filewire-client")]
#[command(about = "Fetch files from a filewire server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:1234")]
    server: String,

    /// Response read mode: byte or line
    #[arg(short, long, default_value = "byte")]
    mode: ReadMode,

    /// Write each file into this directory instead of stdout
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Files to request, in order
    #[arg(default_values = ["test1.txt", "test2.txt", "test3.txt"])]
    files: Vec<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,filewire=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> filewire::Result<()> {
    let config = Config::builder()
        .server_addr(&args.server)
        .read_mode(args.mode)
        .build();

    let mut client = FileClient::connect_with_config(&config)?;
    tracing::info!("File client connected to {}", client.peer_addr());

    for name in &args.files {
        let file = client.fetch(name)?;
        tracing::info!(
            "{}: {} bytes, crc32 {:08x}",
            file.name,
            file.len(),
            file.checksum
        );

        match &args.out_dir {
            Some(dir) => {
                let target = dir.join(sanitize(&file.name));
                std::fs::write(&target, &file.data).map_err(|e| {
                    filewire::FileWireError::FileAccess {
                        path: target.display().to_string(),
                        source: e,
                    }
                })?;
            }
            None => {
                use std::io::Write;
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&file.data)?;
                stdout.flush()?;
            }
        }
    }

    client.close()?;
    tracing::info!("Requests finished");
    Ok(())
}

/// Keep only the final path component of a requested name
fn sanitize(name: &str) -> String {
    std::path::Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}
