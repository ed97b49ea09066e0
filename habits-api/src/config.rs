use std::time::Duration;

use url::Url;

use crate::error::{ApiError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`crate::HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, e.g. "http://localhost:8080/api"
    pub base_url: Url,
    /// Deadline for a single request; exceeding it is a network error.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a base URL so that relative joins keep its path ("/api" + "habits"
/// must give "/api/habits", not "/habits").
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ApiError::unexpected("API base URL is empty"));
    }
    Ok(Url::parse(&format!("{}/", trimmed))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let config = ClientConfig::new("http://localhost:8080/api").unwrap();
        let joined = config.base_url.join("habits/3").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:8080/api/habits/3");

        let config = ClientConfig::new("http://localhost:8080/api///").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/api/");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(ClientConfig::new("  ").is_err());
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        let config = ClientConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
