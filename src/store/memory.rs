//! In-memory file store

use std::collections::HashMap;
use std::io::Cursor;

use bytes::Bytes;

use super::{FileHandle, FileStore};
use crate::error::Result;

/// Fixed set of named files held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: HashMap<String, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Bytes>) {
        self.files.insert(name.into(), contents.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileStore for MemoryStore {
    fn open(&self, name: &str) -> Result<Option<FileHandle>> {
        Ok(self
            .files
            .get(name)
            .map(|contents| FileHandle::new(name, Cursor::new(contents.clone()))))
    }
}
