//! Core types and contracts shared across all Pulse crates

pub mod config;
pub mod error;
pub mod page;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use page::{load_page, PageLoad, ReportSlot, RequestTicket};
pub use reporting::*;
pub use types::*;
pub use utils::*;

// Re-export external dependencies
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
