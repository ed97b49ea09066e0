use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use habits_api::{ClientConfig, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};

pub const API_URL_ENV: &str = "HABITS_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitsConfig {
    /// Base URL of the REST API, e.g. "http://localhost:8080/api"
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Page size for habit and progress lists
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Extra attempts for list loads that fail transiently
    #[serde(default = "default_load_retries")]
    pub load_retries: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> u32 {
    20
}

fn default_load_retries() -> u32 {
    2
}

impl Default for HabitsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            load_retries: default_load_retries(),
        }
    }
}

impl HabitsConfig {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("habits"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from disk, then apply the `HABITS_API_URL` override.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(%url, "API URL taken from environment");
                config.api_url = url;
            }
        }
        Ok(config)
    }

    /// Returns the default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write config at {}", path.display()))?;
        Ok(())
    }

    /// Write the default file if none exists yet and return its path.
    pub fn ensure_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::new(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;
        Ok(config.with_timeout(Duration::from_secs(self.request_timeout_secs.max(1))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HabitsConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, HabitsConfig::default());
        assert_eq!(config.api_url, "http://localhost:8080/api");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://habits.example.com/api\"\n").unwrap();

        let config = HabitsConfig::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://habits.example.com/api");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = HabitsConfig {
            page_size: 50,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(HabitsConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn bad_url_is_reported() {
        let config = HabitsConfig {
            api_url: "not a url".into(),
            ..Default::default()
        };
        let err = config.client_config().unwrap_err();
        assert!(err.to_string().contains("Invalid API URL"));
    }
}
