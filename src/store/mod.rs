//! Store Module
//!
//! File access collaborator used by the server.
//!
//! ## Responsibilities
//! - Resolve a requested filename to a readable handle, or report absence
//! - Hand out file contents one byte at a time
//!
//! A missing file is not an error: `open` returns `Ok(None)` and the server
//! answers with an empty response.

mod directory;
mod memory;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

use std::io::{BufRead, BufReader, ErrorKind, Read};

use crate::error::{FileWireError, Result};

/// Source of files that can be requested by name
pub trait FileStore: Send + Sync {
    /// Open `name` for reading, or `None` if it does not resolve to a readable file
    fn open(&self, name: &str) -> Result<Option<FileHandle>>;
}

/// An open file, read one byte at a time
///
/// Owned by the server for the duration of one request.
pub struct FileHandle {
    name: String,
    reader: Box<dyn BufRead + Send>,
}

impl FileHandle {
    /// Wrap any reader as a file handle
    pub fn new<R: Read + Send + 'static>(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(BufReader::new(reader)),
        }
    }

    /// Name the handle was opened under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next byte of the file, or `None` at end-of-file
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(FileWireError::FileAccess {
                        path: self.name.clone(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Release the underlying file
    pub fn close(self) {
        tracing::trace!("Closing file handle {}", self.name);
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle").field("name", &self.name).finish()
    }
}
