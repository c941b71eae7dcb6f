//! Configuration for filewire
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{FileWireError, Result};
use crate::protocol::DEFAULT_PORT;

/// Main configuration for a filewire server or client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address (server only)
    pub listen_addr: String,

    /// Address the client connects to
    pub server_addr: String,

    /// Max concurrent client connections (server only)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // File Serving Configuration
    // -------------------------------------------------------------------------
    /// Directory that requested filenames are resolved against
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// How the client consumes one response unit
    pub read_mode: ReadMode,
}

/// How a client consumes the response stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// One payload byte per read
    #[default]
    Byte,

    /// One `\n`-delimited line (or the tail before the terminator) per read
    Line,
}

impl std::str::FromStr for ReadMode {
    type Err = FileWireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "byte" => Ok(ReadMode::Byte),
            "line" => Ok(ReadMode::Line),
            other => Err(FileWireError::Config(format!(
                "unknown read mode '{}' (expected 'byte' or 'line')",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            root_dir: PathBuf::from("."),
            read_mode: ReadMode::Byte,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make the server unusable
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(FileWireError::Config("listen address is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(FileWireError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.root_dir.as_os_str().is_empty() {
            return Err(FileWireError::Config("root directory is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the address a client connects to
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the directory files are served from
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the client read mode
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.config.read_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
