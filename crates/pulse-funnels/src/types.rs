use pulse_core::UtcDateTime;
use serde::{Deserialize, Serialize};

/// Steps a new funnel page starts with
pub const DEFAULT_STEPS: [&str; 4] = ["app_open", "login", "view_item", "purchase"];

/// Preset loaded automatically when its project is selected
pub const DEFAULT_PRESET_NAME: &str = "Default";

/// Named step list saved for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelPreset {
    pub preset_name: String,
    pub steps: Vec<String>,
    pub created_at: UtcDateTime,
}

/// Metrics of one funnel step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStepResult {
    pub event_name: String,
    /// Users or processes reaching this step
    pub count: u64,
    /// Share of the previous step lost here, absent for the first step
    pub drop_off_percent: Option<f64>,
    /// Share of the previous step retained here, absent for the first step
    pub conversion_rate_percent: Option<f64>,
    /// Count relative to the first step
    pub bar_width_percent: f64,
}
