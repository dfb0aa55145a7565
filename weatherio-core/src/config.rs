use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::endpoint::ApiUrls;

/// Top-level configuration stored on disk.
///
/// Everything except the API key has a serviceable default, so a config
/// file containing only `api_key = "..."` is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeatherMap API key.
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_units")]
    pub units: String,

    /// Result limit applied to both geocoding endpoints.
    #[serde(default = "default_search_limit")]
    pub search_limit: u8,

    /// Quiet period before a typed query is sent, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on one full dashboard refresh, in seconds.
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

const fn default_search_limit() -> u8 {
    5
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_request_timeout_secs() -> u64 {
    10
}

const fn default_load_timeout_secs() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            units: default_units(),
            search_limit: default_search_limit(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            load_timeout_secs: default_load_timeout_secs(),
        }
    }
}

impl Config {
    /// The configured API key, or a fail-fast error telling the user how to
    /// set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weatherio configure` and enter your OpenWeatherMap API key."
            )
        })
    }

    /// Build the URL set for the API client, validating key and base URL.
    pub fn api_urls(&self) -> Result<ApiUrls> {
        let api_key = self.require_api_key()?;

        let base: Url = self
            .base_url
            .parse()
            .with_context(|| format!("Invalid base URL in config: {}", self.base_url))?;

        Ok(ApiUrls::new(base, api_key, &self.units, self.search_limit))
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherio", "weatherio-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.require_api_key().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `weatherio configure`"));
    }

    #[test]
    fn api_urls_errors_without_key() {
        let cfg = Config::default();
        assert!(cfg.api_urls().is_err());
    }

    #[test]
    fn api_urls_builds_once_key_is_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let urls = cfg.api_urls().expect("key and base URL are valid");
        let url = urls.geo_search("London");
        assert!(url.as_str().starts_with("https://api.openweathermap.org"));
    }

    #[test]
    fn minimal_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(r#"api_key = "KEY""#).expect("minimal config parses");

        assert_eq!(cfg.api_key.as_deref(), Some("KEY"));
        assert_eq!(cfg.units, "metric");
        assert_eq!(cfg.search_limit, 5);
        assert_eq!(cfg.debounce_ms, 500);
        assert_eq!(cfg.base_url, "https://api.openweathermap.org");
    }

    #[test]
    fn durations_come_from_configured_values() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "KEY"
            debounce_ms = 250
            request_timeout_secs = 3
            load_timeout_secs = 7
            "#,
        )
        .expect("config parses");

        assert_eq!(cfg.debounce(), Duration::from_millis(250));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.load_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let serialized = toml::to_string_pretty(&cfg).expect("config serializes");
        let restored: Config = toml::from_str(&serialized).expect("config parses back");

        assert_eq!(restored.api_key.as_deref(), Some("KEY"));
        assert_eq!(restored.debounce_ms, cfg.debounce_ms);
    }
}
