//! Durable key/value storage for state that survives restarts.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::error::MedemapResult;

/// Key holding the persisted selection as JSON.
pub const SELECTION_STORAGE_KEY: &str = "selectedOptions";
/// Key set to `"true"` once the first-run splash has been shown.
pub const SPLASH_STORAGE_KEY: &str = "splashScreenShown";

/// String key/value store. Writes are synchronous; once `set` returns the value is durable.
pub trait DurableStorage {
    fn get(&self, key: &str) -> MedemapResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> MedemapResult<()>;
    fn remove(&mut self, key: &str) -> MedemapResult<()>;
}

/// Storage kept in memory, lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> MedemapResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> MedemapResult<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> MedemapResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> MedemapResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                // The next write replaces the file.
                warn!(
                    "Ignoring unreadable storage file {}: {err}",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> MedemapResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        debug!("Saved storage to {}", self.path.display());
        Ok(())
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> MedemapResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> MedemapResult<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> MedemapResult<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let mut storage = FileStorage::new(&path);
        storage.set(SPLASH_STORAGE_KEY, "true").unwrap();
        storage.set(SELECTION_STORAGE_KEY, "{}").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get(SPLASH_STORAGE_KEY).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(reopened.get(SELECTION_STORAGE_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{truncated").unwrap();
        let mut storage = FileStorage::new(&path);
        assert_eq!(storage.get(SPLASH_STORAGE_KEY).unwrap(), None);
        storage.remove(SELECTION_STORAGE_KEY).unwrap();
        storage.set(SPLASH_STORAGE_KEY, "true").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get(SPLASH_STORAGE_KEY).unwrap().as_deref(),
            Some("true")
        );
    }
}
