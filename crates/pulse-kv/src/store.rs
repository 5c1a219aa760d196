use pulse_core::ProjectKey;

use crate::error::StoreError;

/// Durable string key/value storage
///
/// Operations are synchronous; callers treat every failure as recoverable.
pub trait PersistentStore: Send + Sync {
    /// Get a value by key, `None` when nothing is stored
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key, returning whether something was removed
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// Build the per-project key used for project scoped records
///
/// `namespaced_key("funnel_presets_", &key)` gives `funnel_presets_<key>`.
pub fn namespaced_key(prefix: &str, project_key: &ProjectKey) -> String {
    format!("{}{}", prefix, project_key)
}
