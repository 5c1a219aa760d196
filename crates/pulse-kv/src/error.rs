//! Error types for the KV store

use thiserror::Error;

/// Errors that can occur while reading or writing persisted records
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record under '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
