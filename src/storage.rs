//! Durable key-value persistence for client-side state.
//!
//! The session store writes its transcript through [`PersistencePort`]
//! after every mutation. Two implementations:
//! - **[`FileStore`]**: one JSON file per key under a directory, replaced
//!   atomically (tmp file + rename).
//! - **[`MemoryStore`]**: a `HashMap` behind a lock, for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};

/// Synchronous key-value storage for serialized snapshots.
pub trait PersistencePort: Send + Sync {
    /// Returns `None` when nothing has been stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl PersistencePort for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. a corrupted snapshot.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl PersistencePort for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<P: PersistencePort + ?Sized> PersistencePort for std::sync::Arc<P> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        assert_eq!(store.load("ds_messages").unwrap(), None);
    }

    #[test]
    fn test_file_store_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nested"));
        store.save("ds_messages", "[]").unwrap();
        store.save("ds_messages", "[1]").unwrap();
        assert_eq!(store.load("ds_messages").unwrap().as_deref(), Some("[1]"));
        assert!(tmp.path().join("nested/ds_messages.json").exists());
        assert!(!tmp.path().join("nested/ds_messages.json.tmp").exists());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
    }
}
