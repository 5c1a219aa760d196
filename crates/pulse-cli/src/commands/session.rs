//! Wiring shared by every command
//!
//! Builds the runtime, the file store, the shared filters and the reporting
//! client from the global flags.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pulse_client::HttpReportingClient;
use pulse_core::DashboardConfig;
use pulse_filters::FilterState;
use pulse_funnels::{FunnelPage, FunnelService, PresetStore};
use pulse_kv::{FileStore, PersistentStore};
use tokio::runtime::Runtime;
use tracing::debug;

#[derive(Args)]
pub struct GlobalArgs {
    /// Base URL of the reporting API
    #[arg(long, env = "PULSE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the reporting API
    #[arg(long, env = "PULSE_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Directory holding persisted filters and presets (default: ~/.pulse)
    #[arg(long, env = "PULSE_STORAGE_DIR", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "PULSE_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,
}

impl GlobalArgs {
    /// Flags override the defaults field by field
    pub fn into_config(self) -> DashboardConfig {
        let mut config = DashboardConfig::default();
        if let Some(url) = self.api_url {
            config.api_base_url = url;
        }
        if let Some(token) = self.api_token {
            config.api_token = Some(token);
        }
        if let Some(dir) = self.storage_dir {
            config.storage_dir = dir;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        config
    }
}

/// Everything a command needs, owned for the lifetime of the command
pub struct Session {
    pub runtime: Runtime,
    pub store: Arc<dyn PersistentStore>,
    pub filters: Arc<FilterState>,
    pub config: DashboardConfig,
}

impl Session {
    /// Open the store and load the persisted filters; no network access yet
    pub fn open(config: DashboardConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let runtime = Runtime::new()?;
        let store: Arc<dyn PersistentStore> = Arc::new(FileStore::open(&config.storage_dir)?);
        debug!("Using storage directory {}", config.storage_dir.display());

        let filters = Arc::new(FilterState::load(store.clone(), runtime.handle().clone()));

        Ok(Self {
            runtime,
            store,
            filters,
            config,
        })
    }

    pub fn presets(&self) -> PresetStore {
        PresetStore::new(self.store.clone())
    }

    pub fn funnel_service(&self) -> anyhow::Result<FunnelService> {
        let client = HttpReportingClient::new(&self.config)?;
        Ok(FunnelService::new(Arc::new(client)))
    }

    pub fn funnel_page(&self) -> anyhow::Result<FunnelPage> {
        Ok(FunnelPage::new(
            self.funnel_service()?,
            self.presets(),
            self.filters.clone(),
        ))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.filters.shutdown();
    }
}
