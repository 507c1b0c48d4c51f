//! Persistence - whole-snapshot JSON records in a flat key-value store
//!
//! Three independent records: collections, history and environments. Reads
//! are validated into typed records at this boundary; a missing or malformed
//! record loads as an empty list.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::constants::{KEY_COLLECTIONS, KEY_ENVIRONMENTS, KEY_HISTORY};
use crate::models::{Collection, Environment, HistoryEntry};

/// Raw key-value backend holding one JSON document per key
pub trait Store: Send {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, json: &str) -> Result<()>;
}

/// One `<key>.json` file per record
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Store for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read `{}`", path.display()))?;
        Ok(Some(raw))
    }

    fn write(&mut self, key: &str, json: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory `{}`", self.dir.display()))?;
        let path = self.path_for(key);
        // Atomic replace through a temp file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write `{}`", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace `{}`", path.display()))?;
        Ok(())
    }
}

/// In-memory backend
#[derive(Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, json: &str) -> Result<()> {
        self.records.insert(key.to_string(), json.to_string());
        Ok(())
    }
}

/// Typed access to the three records
pub struct Storage {
    store: Box<dyn Store>,
}

impl Storage {
    pub fn new(store: impl Store + 'static) -> Self {
        Storage {
            store: Box::new(store),
        }
    }

    /// File-backed storage in `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStore::new(dir))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.load(KEY_COLLECTIONS)
    }

    pub fn save_collections(&mut self, collections: &[Collection]) -> Result<()> {
        self.save(KEY_COLLECTIONS, collections)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.load(KEY_HISTORY)
    }

    pub fn save_history(&mut self, history: &[HistoryEntry]) -> Result<()> {
        self.save(KEY_HISTORY, history)
    }

    pub fn environments(&self) -> Vec<Environment> {
        self.load(KEY_ENVIRONMENTS)
    }

    pub fn save_environments(&mut self, environments: &[Environment]) -> Result<()> {
        self.save(KEY_ENVIRONMENTS, environments)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read record");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding malformed record");
                Vec::new()
            }
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .with_context(|| format!("Failed to serialize `{}`", key))?;
        self.store.write(key, &json)?;
        tracing::debug!(key, count = records.len(), "Record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiRequest;

    #[test]
    fn file_store_round_trips_collections() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::open(dir.path());
        assert!(storage.collections().is_empty());

        let mut collection = Collection::new("Api");
        collection.requests.push(ApiRequest::default());
        storage.save_collections(&[collection.clone()]).unwrap();

        assert!(dir.path().join("jarvis-collections.json").exists());
        let reopened = Storage::open(dir.path());
        assert_eq!(reopened.collections(), vec![collection]);
    }

    #[test]
    fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut storage = Storage::open(&nested);
        storage.save_environments(&[Environment::new("dev")]).unwrap();
        assert_eq!(storage.environments()[0].name, "dev");
    }

    #[test]
    fn malformed_record_loads_empty() {
        let mut store = MemoryStore::new();
        store.write(KEY_HISTORY, "{\"not\": \"a list\"}").unwrap();
        let storage = Storage::new(store);
        assert!(storage.history().is_empty());
    }

    #[test]
    fn records_are_independent() {
        let mut storage = Storage::in_memory();
        storage.save_environments(&[Environment::new("prod")]).unwrap();
        assert!(storage.collections().is_empty());
        assert!(storage.history().is_empty());
        assert_eq!(storage.environments().len(), 1);
    }
}
