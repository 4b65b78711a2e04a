//! Shared state for a single command invocation.

use anyhow::Context as _;
use ctrlv_client::{SharedSnippetService, SnippetClient};
use ctrlv_core::{Bus, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::notify::Dispatcher;

/// Config flags that apply to every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub origin: Option<String>,
}

pub struct AppContext {
    pub config: Config,
    pub sources: Vec<PathBuf>,
    pub service: SharedSnippetService,
    pub bus: Bus,
}

impl AppContext {
    /// Load config, apply command line overrides, build the service client.
    pub async fn load(cwd: &Path, overrides: Overrides) -> anyhow::Result<Self> {
        let (config, sources) = Config::load(Some(cwd))
            .await
            .context("failed to load configuration")?;
        Self::from_config(config, sources, overrides)
    }

    pub fn from_config(
        mut config: Config,
        sources: Vec<PathBuf>,
        overrides: Overrides,
    ) -> anyhow::Result<Self> {
        if overrides.api_url.is_some() {
            config.api_url = overrides.api_url;
        }
        if overrides.origin.is_some() {
            config.origin = overrides.origin;
        }

        let client = SnippetClient::new(config.api_url(), config.api_prefix(), config.timeout())
            .with_context(|| format!("invalid service address {}", config.api_url()))?;
        tracing::debug!(base_url = client.base_url(), "snippet client ready");

        Ok(Self {
            config,
            sources,
            service: Arc::new(client),
            bus: Bus::new(),
        })
    }

    pub async fn dispatcher(&self) -> Dispatcher {
        Dispatcher::attach(&self.bus, self.config.origin()).await
    }
}
