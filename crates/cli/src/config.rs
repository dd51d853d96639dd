//! CLI configuration utilities

use anyhow::{Context, Result};
use dashboard_core::default_state_dir;
use dashboard_core::tracing::LogFormat;
use dashboard_http::ClientConfig;
use dashboard_http::client::config::ENV_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// API client settings
    pub api: ClientConfig,

    /// Directory for credentials and logs
    pub data_dir: Option<PathBuf>,

    /// Logging settings
    pub log: LogSettings,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Line format on stderr
    pub format: LogFormat,

    /// Also write logs to `dashboard.log` in the data directory
    pub file: bool,
}

impl CliConfig {
    /// Load configuration from an explicit file, or from the default location
    /// when present, overridden by `DASHBOARD_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(default_config_path()).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        Ok(settings.try_deserialize()?)
    }

    /// Data directory, falling back to the platform default
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_state_dir)
    }
}

/// `<config dir>/dashboard/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dashboard")
        .join("config.toml")
}
