//! Durable key/value storage for session snapshots
//!
//! The session never talks to the filesystem directly; it goes through
//! [`StateStorage`], which has a file-backed implementation for real use and an
//! in-memory one for tests and embedding.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CheckinError;

/// Key the session snapshot is stored under
pub const DEFAULT_STORAGE_KEY: &str = "silentrisk-state";

/// Minimal key/value store with string payloads
pub trait StateStorage {
    /// Read the value stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<String>, CheckinError>;

    /// Store `value` under `key`, replacing any previous value
    fn write(&mut self, key: &str, value: &str) -> Result<(), CheckinError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), CheckinError>;
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CheckinError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), CheckinError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CheckinError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed storage: one `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf, CheckinError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CheckinError::StorageError(format!(
                "invalid storage key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CheckinError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), CheckinError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write a sibling file then rename so readers never see a partial record
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CheckinError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basic() {
        let mut storage = MemoryStorage::new();
        assert!(storage.read("k").unwrap().is_none());

        storage.write("k", "v1").unwrap();
        storage.write("k", "v2").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.len(), 1);

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.read(DEFAULT_STORAGE_KEY).unwrap().is_none());

        storage.write(DEFAULT_STORAGE_KEY, "{\"a\":1}").unwrap();
        assert_eq!(
            storage.read(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("nested/silentrisk-state.json").exists());
        assert!(!dir.path().join("nested/.silentrisk-state.json.tmp").exists());

        storage.remove(DEFAULT_STORAGE_KEY).unwrap();
        assert!(storage.read(DEFAULT_STORAGE_KEY).unwrap().is_none());
        storage.remove(DEFAULT_STORAGE_KEY).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let storage = FileStorage::new("/tmp/unused");
        assert!(storage.path_for("../escape").is_err());
        assert!(storage.path_for("").is_err());
        assert!(storage.path_for(".hidden").is_err());
        assert!(storage.path_for("ok-key").is_ok());
    }
}
