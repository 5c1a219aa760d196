mod definition;
mod metrics;
mod presets;
mod service;

pub use definition::{validate_steps, FunnelDefinition};
pub use metrics::{compute_step_metrics, overall_conversion_percent};
pub use presets::{PresetStore, PRESETS_KEY_PREFIX};
pub use service::{available_suggestions, FunnelService};
