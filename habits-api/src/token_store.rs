use std::path::{Path, PathBuf};
use std::sync::Mutex;
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use crate::error::{ApiError, Result};
use crate::models::TokenPair;

/// Durable home of the access/refresh token pair.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<TokenPair>>;
    fn save(&self, tokens: &TokenPair) -> Result<()>;
    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|t| t.access_token))
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|t| t.refresh_token))
    }
}

/// Tokens stored as `{"accessToken": .., "refreshToken": ..}` in a file only
/// the current user can read.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/habits/tokens.json`
    pub fn default_location() -> Result<Self> {
        let root = dirs::config_dir()
            .ok_or_else(|| ApiError::unexpected("Cannot determine config directory"))?;
        Ok(Self::new(root.join("habits").join("tokens.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn secure_write(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| ApiError::unexpected(format!("Failed to read token file: {e}")))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<TokenPair>(&raw) {
            Ok(tokens) if !tokens.access_token.is_empty() => Ok(Some(tokens)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable token file");
                Ok(None)
            }
        }
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let content = serde_json::to_string(tokens)
            .map_err(|e| ApiError::unexpected(format!("Failed to encode tokens: {e}")))?;
        secure_write(&self.path, &content)
            .map_err(|e| ApiError::unexpected(format!("Failed to write token file: {e}")))
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| ApiError::unexpected(format!("Failed to remove token file: {e}")))?;
        }
        Ok(())
    }
}

/// In-process store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self
            .tokens
            .lock()
            .map_err(|_| ApiError::unexpected("token store lock poisoned"))?
            .clone())
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        *self
            .tokens
            .lock()
            .map_err(|_| ApiError::unexpected("token store lock poisoned"))? = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .tokens
            .lock()
            .map_err(|_| ApiError::unexpected("token store lock poisoned"))? = None;
        Ok(())
    }
}
