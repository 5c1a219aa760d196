use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::StoreError;
use crate::store::PersistentStore;

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with a record written by an earlier session
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!("KV SET {} ({} bytes)", key, value.len());
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        debug!("KV DEL {}", key);
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(entries.remove(key).is_some())
    }
}
