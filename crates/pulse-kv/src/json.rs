//! JSON record helpers on top of [`PersistentStore`]

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::store::PersistentStore;

/// Typed access to JSON records
///
/// Implemented for every store, including `dyn PersistentStore`.
pub trait JsonStoreExt: PersistentStore {
    /// Strict read: malformed JSON is reported as [`StoreError::Corrupt`]
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Lenient read: unreadable or malformed records count as absent
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_json(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring unreadable record '{}': {}", key, e);
                None
            }
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set(key, &serialized)
    }

    /// Read-modify-write of one record, starting from the default when the
    /// stored record is missing or corrupt
    fn update_json<T, F>(&self, key: &str, apply: F) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T),
    {
        let mut value: T = self.load_json(key).unwrap_or_default();
        apply(&mut value);
        self.put_json(key, &value)?;
        Ok(value)
    }
}

impl<S: PersistentStore + ?Sized> JsonStoreExt for S {}
