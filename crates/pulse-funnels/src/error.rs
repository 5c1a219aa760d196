use pulse_core::ApiError;
use thiserror::Error;

/// Rejected step lists and funnel settings
///
/// Always recoverable: the mutation or run is refused and the previous state
/// stays in place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A funnel needs at least 2 steps")]
    TooFewSteps,

    #[error("Funnel steps cannot be blank")]
    BlankStep,

    #[error("Duplicate funnel step: {}", .0.join(", "))]
    DuplicateStep(Vec<String>),

    #[error("A process name is required in process mode")]
    MissingProcessName,
}

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Select a project first")]
    NoProjectSelected,

    #[error("Reporting API error: {0}")]
    Api(#[from] ApiError),
}

impl FunnelError {
    /// Message for the inline error or the page banner
    pub fn user_message(&self) -> String {
        match self {
            FunnelError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("Preset name cannot be blank")]
    BlankName,

    #[error("A preset needs at least 2 steps")]
    TooFewSteps,
}
