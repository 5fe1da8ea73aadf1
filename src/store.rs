//! Durable key-value storage for the task list.
//!
//! The task list only ever needs two things from its backing store: read the
//! last value written under a key, and replace it. `KeyValueStore` captures
//! that contract; `FileStore` keeps one JSON file per key on disk and
//! `MemoryStore` keeps everything in process.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::config::Storage;

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid store key '{0}'")]
    InvalidKey(String),
}

/// A durable slot of string values addressed by string keys.
pub trait KeyValueStore {
    /// Return the last value written under `key`, or `None` if nothing was.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Open the store selected by `storage`.
pub fn open_store(storage: &Storage) -> Result<Box<dyn KeyValueStore>, StoreError> {
    match storage {
        Storage::Dir(dir) => {
            info!("using task store in {}", dir.display());
            Ok(Box::new(FileStore::open(dir)?))
        }
        Storage::Memory => {
            info!("using in-memory task store");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Store that keeps each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        let mut buf = String::new();
        match File::open(&path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => Ok(Some(buf)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let write = || -> io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.flush()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with an existing value.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_missing_key_reads_none() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("TASKS_LIST").unwrap(), None);
    }

    #[test]
    fn test_file_store_set_then_get() {
        let temp = tempdir().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();
        store.set("TASKS_LIST", "[]").unwrap();
        assert_eq!(store.get("TASKS_LIST").unwrap().as_deref(), Some("[]"));

        store.set("TASKS_LIST", "[1]").unwrap();
        assert_eq!(store.get("TASKS_LIST").unwrap().as_deref(), Some("[1]"));
        assert!(!temp.path().join("TASKS_LIST.json.tmp").exists());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp = tempdir().unwrap();
        {
            let mut store = FileStore::open(temp.path()).unwrap();
            store.set("TASKS_LIST", "persisted").unwrap();
        }
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("TASKS_LIST").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_file_store_creates_directory() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let temp = tempdir().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();
        for key in ["", "../escape", "a/b", "a b", "."] {
            assert!(matches!(store.get(key), Err(StoreError::InvalidKey(_))), "{key}");
            assert!(matches!(store.set(key, "x"), Err(StoreError::InvalidKey(_))), "{key}");
        }
        let mut memory = MemoryStore::new();
        assert!(matches!(memory.set("a/b", "x"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        // A directory where the file should be cannot be read as a string.
        fs::create_dir(temp.path().join("TASKS_LIST.json")).unwrap();
        assert!(matches!(store.get("TASKS_LIST"), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_open_store() {
        let temp = tempdir().unwrap();
        let mut store = open_store(&Storage::Dir(temp.path().join("data"))).unwrap();
        store.set("TASKS_LIST", "[]").unwrap();
        assert!(temp.path().join("data").join("TASKS_LIST.json").exists());

        let mut store = open_store(&Storage::Memory).unwrap();
        store.set("TASKS_LIST", "[]").unwrap();
        assert_eq!(store.get("TASKS_LIST").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::with_entry("k", "v");
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("other").unwrap(), None);
        store.set("k", "w").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("w"));
    }
}
