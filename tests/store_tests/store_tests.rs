//! Tests for file stores
//!
//! These tests verify:
//! - Directory resolution and refusal of escaping paths
//! - Missing files reported as absence, not errors
//! - Byte-at-a-time reads through FileHandle

use std::fs;

use filewire::store::{DirectoryStore, FileHandle, FileStore, MemoryStore};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn read_all(handle: &mut FileHandle) -> Vec<u8> {
    let mut bytes = Vec::new();
    while let Some(b) = handle.read_byte().unwrap() {
        bytes.push(b);
    }
    bytes
}

fn setup_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), b"hi").unwrap();
    fs::write(dir.path().join("empty.txt"), b"").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("nested.txt"), b"deep").unwrap();
    dir
}

// =============================================================================
// DirectoryStore Tests
// =============================================================================

#[test]
fn test_directory_open_existing_file() {
    let dir = setup_dir();
    let store = DirectoryStore::new(dir.path());

    let mut handle = store.open("a.txt").unwrap().unwrap();
    assert_eq!(handle.name(), "a.txt");
    assert_eq!(read_all(&mut handle), b"hi");
}

#[test]
fn test_directory_missing_file_is_none() {
    let dir = setup_dir();
    let store = DirectoryStore::new(dir.path());

    assert!(store.open("missing.txt").unwrap().is_none());
}

#[test]
fn test_directory_empty_file() {
    let dir = setup_dir();
    let store = DirectoryStore::new(dir.path());

    let mut handle = store.open("empty.txt").unwrap().unwrap();
    assert_eq!(handle.read_byte().unwrap(), None);
}

#[test]
fn test_directory_nested_path() {
    let dir = setup_dir();
    let store = DirectoryStore::new(dir.path());

    let mut handle = store.open("sub/nested.txt").unwrap().unwrap();
    assert_eq!(read_all(&mut handle), b"deep");

    let mut handle = store.open("./sub/nested.txt").unwrap().unwrap();
    assert_eq!(read_all(&mut handle), b"deep");
}

#[test]
fn test_directory_is_not_a_file() {
    let dir = setup_dir();
    let store = DirectoryStore::new(dir.path());

    assert!(store.open("sub").unwrap().is_none());
    assert!(store.open(".").unwrap().is_none());
}

#[test]
fn test_directory_refuses_parent_components() {
    let outer = TempDir::new().unwrap();
    fs::write(outer.path().join("secret.txt"), b"nope").unwrap();
    let root = outer.path().join("served");
    fs::create_dir(&root).unwrap();

    let store = DirectoryStore::new(&root);
    assert!(store.open("../secret.txt").unwrap().is_none());
    assert!(store.open("sub/../../secret.txt").unwrap().is_none());
}

#[test]
fn test_directory_refuses_absolute_path() {
    let dir = setup_dir();
    let store = DirectoryStore::new(dir.path());

    let absolute = dir.path().join("a.txt");
    assert!(store.open(absolute.to_str().unwrap()).unwrap().is_none());
}

#[test]
fn test_directory_reads_every_byte_value() {
    let dir = TempDir::new().unwrap();
    let contents: Vec<u8> = (0u8..=255).collect();
    fs::write(dir.path().join("all.bin"), &contents).unwrap();

    let store = DirectoryStore::new(dir.path());
    let mut handle = store.open("all.bin").unwrap().unwrap();
    assert_eq!(read_all(&mut handle), contents);
}

// =============================================================================
// MemoryStore Tests
// =============================================================================

#[test]
fn test_memory_store_lookup() {
    let store = MemoryStore::new()
        .with_file("a.txt", &b"hi"[..])
        .with_file("b.txt", b"there".to_vec());

    assert_eq!(store.len(), 2);
    let mut handle = store.open("b.txt").unwrap().unwrap();
    assert_eq!(read_all(&mut handle), b"there");
    assert!(store.open("c.txt").unwrap().is_none());
}

#[test]
fn test_memory_store_handles_are_independent() {
    let store = MemoryStore::new().with_file("x", &b"xyz"[..]);

    let mut first = store.open("x").unwrap().unwrap();
    assert_eq!(first.read_byte().unwrap(), Some(b'x'));

    let mut second = store.open("x").unwrap().unwrap();
    assert_eq!(read_all(&mut second), b"xyz");
    assert_eq!(read_all(&mut first), b"yz");
}

#[test]
fn test_memory_store_insert_replaces() {
    let mut store = MemoryStore::new();
    assert!(store.is_empty());

    store.insert("f", &b"old"[..]);
    store.insert("f", &b"new"[..]);

    let mut handle = store.open("f").unwrap().unwrap();
    assert_eq!(read_all(&mut handle), b"new");
}

#[test]
fn test_file_handle_from_any_reader() {
    let mut handle = FileHandle::new("cursor", std::io::Cursor::new(vec![1u8, 2, 3]));
    assert_eq!(read_all(&mut handle), vec![1, 2, 3]);
    handle.close();
}
