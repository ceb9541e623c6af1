use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

/// Identifier sent upstream when none is configured. Nominatim's policy wants
/// an application name plus a way to reach the operator.
pub const DEFAULT_USER_AGENT: &str =
    concat!("CityAir/", env!("CARGO_PKG_VERSION"), " (contact: ops@example.com)");

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

pub const DEFAULT_PAST_DAYS: u32 = 7;

/// Per-provider overrides. Anything left out uses the provider default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Client identifier sent to every upstream provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Listen address for `cityair serve`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Trailing window of hourly history, in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_days: Option<u32>,

    /// Example TOML:
    /// [providers.nominatim]
    /// base_url = "http://localhost:8080/search"
    /// timeout_secs = 5
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn set_user_agent(&mut self, user_agent: String) {
        self.user_agent = Some(user_agent);
    }

    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn set_bind_addr(&mut self, bind: String) {
        self.bind = Some(bind);
    }

    pub fn past_days(&self) -> u32 {
        self.past_days.unwrap_or(DEFAULT_PAST_DAYS)
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Upstream URL for a provider: the override if set, otherwise the public endpoint.
    pub fn endpoint(&self, id: ProviderId) -> &str {
        self.provider_config(id)
            .and_then(|cfg| cfg.base_url.as_deref())
            .unwrap_or(id.default_endpoint())
    }

    pub fn timeout(&self, id: ProviderId) -> Duration {
        self.provider_config(id)
            .and_then(|cfg| cfg.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or_else(|| id.default_timeout())
    }

    pub fn set_endpoint(&mut self, id: ProviderId, base_url: String) {
        self.providers.entry(id.as_str().to_string()).or_default().base_url = Some(base_url);
    }

    pub fn set_timeout_secs(&mut self, id: ProviderId, secs: u64) {
        self.providers.entry(id.as_str().to_string()).or_default().timeout_secs = Some(secs);
    }

    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityair", "cityair")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        for key in self.providers.keys() {
            ProviderId::try_from(key.as_str())?;
        }
        if self.past_days == Some(0) {
            return Err(anyhow!("past_days must be at least 1"));
        }
        Ok(())
    }
}
