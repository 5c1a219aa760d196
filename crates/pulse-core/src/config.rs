//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{ServiceError, ServiceResult};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Dashboard settings
/// All fields have sensible defaults so a bare `pulse` invocation works locally
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the reporting API
    pub api_base_url: String,
    /// Bearer token forwarded to the reporting API
    pub api_token: Option<String>,
    /// Directory holding persisted filters and presets
    pub storage_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            storage_dir: default_storage_dir(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("Pulse-Dashboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DashboardConfig {
    /// Check the settings before any collaborator is built from them
    pub fn validate(&self) -> ServiceResult<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ServiceError::Configuration {
                message: format!("unsupported API URL scheme '{}'", url.scheme()),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ServiceError::Configuration {
                message: "request timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn base_url(&self) -> ServiceResult<Url> {
        Url::parse(&self.api_base_url).map_err(|e| ServiceError::Configuration {
            message: format!("invalid API URL '{}': {}", self.api_base_url, e),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".pulse"))
        .unwrap_or_else(|| PathBuf::from(".pulse"))
}
