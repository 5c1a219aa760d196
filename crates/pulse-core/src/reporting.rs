//! Contract of the remote reporting API
//!
//! The dashboard core never talks HTTP directly. Pages and the funnel engine
//! go through [`ReportingApi`]; `pulse-client` provides the HTTP
//! implementation and tests plug in mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{DateRange, ProjectKey};

/// Project as listed by the reporting API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub project_key: ProjectKey,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// What a funnel counts at each step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunnelMode {
    /// Distinct users reaching each step
    #[default]
    User,
    /// Distinct processes reaching each step
    Process,
}

impl FunnelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelMode::User => "user",
            FunnelMode::Process => "process",
        }
    }

    /// Label of the counted entity, used by report headers
    pub fn count_label(&self) -> &'static str {
        match self {
            FunnelMode::User => "users",
            FunnelMode::Process => "processes",
        }
    }
}

impl fmt::Display for FunnelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunnelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(FunnelMode::User),
            "process" | "processes" => Ok(FunnelMode::Process),
            other => Err(format!("unknown funnel mode '{}'", other)),
        }
    }
}

/// Parameters of a `GetFunnel` call
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelQuery {
    pub project_key: ProjectKey,
    pub steps: Vec<String>,
    pub range: DateRange,
    pub mode: FunnelMode,
    /// Only sent when `mode` is [`FunnelMode::Process`]
    pub process_name: Option<String>,
}

/// Ordered step counts returned by `GetFunnel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelReport {
    pub steps: Vec<FunnelReportStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReportStep {
    pub event_name: String,
    /// Distinct users or distinct processes, depending on the query mode
    pub users: u64,
}

/// Failures of the reporting collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Best-effort human readable message for a page banner
    ///
    /// Server bodies are usually problem details or `{"error": ...}` objects;
    /// the first text field found wins, then a short plain-text body, then the
    /// status code.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { status, body } => message_from_body(body)
                .unwrap_or_else(|| format!("Request failed with status {}", status)),
            ApiError::Transport(msg) => format!("Could not reach the reporting API: {}", msg),
            ApiError::Decode(msg) => format!("Unexpected response from the reporting API: {}", msg),
            ApiError::InvalidRequest(msg) => msg.clone(),
        }
    }
}

const MESSAGE_FIELDS: [&str; 4] = ["detail", "message", "error", "title"];
const MAX_PLAIN_BODY: usize = 200;

fn message_from_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return message_from_json(&value);
    }

    if trimmed.starts_with('<') || trimmed.chars().count() > MAX_PLAIN_BODY {
        return None;
    }
    Some(trimmed.to_string())
}

fn message_from_json(value: &serde_json::Value) -> Option<String> {
    for field in MESSAGE_FIELDS {
        match value.get(field) {
            Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
                return Some(text.trim().to_string());
            }
            // {"error": {"message": "..."}}
            Some(nested @ serde_json::Value::Object(_)) => {
                if let Some(text) = message_from_json(nested) {
                    return Some(text);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reporting API consumed by the dashboard core
#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// List the projects visible to the caller
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    /// Count users or processes reaching each step, one entry per requested
    /// step in request order
    async fn get_funnel(&self, query: &FunnelQuery) -> Result<FunnelReport, ApiError>;

    /// Event names seen in the project, used for step suggestions
    async fn get_event_names(
        &self,
        project_key: &ProjectKey,
        range: &DateRange,
    ) -> Result<Vec<String>, ApiError>;
}
