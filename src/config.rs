use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};

use crate::utils::image_urls::HostRewrite;

const DEFAULT_API_URL: &str = "http://localhost:4000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATE_DIR: &str = ".portfolio";

/// Runtime settings for the client, sourced from the environment.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub state_dir: PathBuf,
    pub asset_rewrite: Option<HostRewrite>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            asset_rewrite: None,
        }
    }
}

impl ClientConfig {
    /// Build a config from `PORTFOLIO_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ClientConfig::default();

        if let Some(url) = lookup("PORTFOLIO_API_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(anyhow!("PORTFOLIO_API_URL must not be empty"));
            }
            config.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("PORTFOLIO_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("PORTFOLIO_TIMEOUT_SECS is not a number: {raw}"))?;
            if secs == 0 {
                return Err(anyhow!("PORTFOLIO_TIMEOUT_SECS must be greater than 0"));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(dir) = lookup("PORTFOLIO_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("PORTFOLIO_ASSET_HOST_REWRITE") {
            let rewrite = HostRewrite::parse(&raw).ok_or_else(|| {
                anyhow!("PORTFOLIO_ASSET_HOST_REWRITE must look like `from=to`, got `{raw}`")
            })?;
            config.asset_rewrite = Some(rewrite);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}
