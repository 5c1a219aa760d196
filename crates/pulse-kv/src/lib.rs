//! pulse-kv: durable key/value storage for dashboard state
//!
//! Stands in for browser local storage: string values under string keys,
//! with JSON helpers that treat malformed records as absent.

pub mod error;
pub mod file;
pub mod json;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use file::FileStore;
pub use json::JsonStoreExt;
pub use memory::MemoryStore;
pub use store::{namespaced_key, PersistentStore};
