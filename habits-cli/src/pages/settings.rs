use anyhow::{Context, Result};
use habits_api::{ClientConfig, FileTokenStore};

use crate::config::HabitsConfig;
use crate::ui::widgets::card;

pub fn show(config: &HabitsConfig, signed_in_as: Option<&str>) -> Result<String> {
    let config_path = HabitsConfig::config_path()?;
    let token_path = FileTokenStore::default_location()?.path().to_path_buf();

    let lines = vec![
        format!("API URL: {}", config.api_url),
        format!("Request timeout: {}s", config.request_timeout_secs),
        format!("Page size: {}", config.page_size),
        format!("Load retries: {}", config.load_retries),
        format!("Config file: {}", config_path.display()),
        format!("Token file: {}", token_path.display()),
        format!("Session: {}", signed_in_as.unwrap_or("not signed in")),
    ];
    Ok(card("Settings", &lines))
}

/// Validate and persist a new API base URL.
pub fn set_api_url(url: &str) -> Result<HabitsConfig> {
    let url = url.trim();
    ClientConfig::new(url).with_context(|| format!("Invalid API URL: {url}"))?;

    let mut config = HabitsConfig::load_from(&HabitsConfig::config_path()?)?;
    config.api_url = url.to_string();
    config.save()?;
    tracing::info!(%url, "API URL updated");
    Ok(config)
}

pub fn config_path() -> Result<String> {
    let path = HabitsConfig::ensure_file()?;
    Ok(path.display().to_string())
}
