//! Layered application configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file at
//! [`config_path`], then `SPORTPRO_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://sportpro-backend-1.onrender.com/api";
/// Request timeout applied by the HTTP adapter.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Number of news items requested per page.
pub const DEFAULT_NEWS_PAGE_SIZE: u32 = 6;

const CONFIG_DIR: &str = "sportpro";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "SPORTPRO";

/// Where equipment filters are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterPolicy {
    /// Every filter is sent as a query parameter and any change refetches.
    #[default]
    Server,
    /// Only the category is sent; sort, price and brand are applied locally.
    Client,
}

impl FilterPolicy {
    /// Configuration spelling of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Items per news page.
    pub news_page_size: u32,
    /// Directory holding the persisted token and cart.
    pub data_dir: PathBuf,
    /// Boundary for equipment filtering.
    #[serde(default)]
    pub filter_policy: FilterPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            news_page_size: DEFAULT_NEWS_PAGE_SIZE,
            data_dir: default_data_dir(),
            filter_policy: FilterPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from an explicit file (which may be absent).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("news_page_size", u64::from(defaults.news_page_size))?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("filter_policy", defaults.filter_policy.as_str())?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        config.news_page_size = config.news_page_size.max(1);
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Default configuration file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Default location for persisted client state.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write a default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_path())
}

fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let defaults = AppConfig::default();
    let contents = format!(
        "# SportPro client configuration\n\
         api_url = \"{}\"\n\
         timeout_secs = {}\n\
         news_page_size = {}\n\
         data_dir = \"{}\"\n\
         # \"server\" sends every equipment filter to the API, \"client\" filters locally\n\
         filter_policy = \"{}\"\n",
        defaults.api_url,
        defaults.timeout_secs,
        defaults.news_page_size,
        defaults.data_dir.display().to_string().replace('\\', "\\\\"),
        defaults.filter_policy.as_str(),
    );
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.news_page_size, DEFAULT_NEWS_PAGE_SIZE);
        assert_eq!(config.filter_policy, FilterPolicy::Server);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"http://localhost:5000/api/\"\nfilter_policy = \"client\"\nnews_page_size = 0\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.filter_policy, FilterPolicy::Client);
        assert_eq!(config.news_page_size, 1);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        ensure_default_config_at(&path)?;
        assert!(path.is_file());

        fs::write(&path, "timeout_secs = 3\n")?;
        ensure_default_config_at(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.timeout_secs, 3);
        Ok(())
    }
}
