//! Funnels module
//!
//! Funnel definitions with step validation, per-step conversion metrics and
//! named per-project presets.

pub mod error;
pub mod page;
pub mod services;
pub mod types;

pub use error::{FunnelError, PresetError, ValidationError};
pub use page::FunnelPage;
pub use services::{
    available_suggestions, compute_step_metrics, overall_conversion_percent, validate_steps,
    FunnelDefinition, FunnelService, PresetStore,
};
pub use types::{FunnelPreset, FunnelStepResult, DEFAULT_PRESET_NAME, DEFAULT_STEPS};
