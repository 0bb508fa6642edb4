//! Credential storage for the REST API token
//!
//! The token is opaque to this crate: it is obtained out-of-band (the login
//! flow is a separate surface) and attached to every request. The only write
//! this core performs is clearing it when the server rejects it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Token filename in the SellUp config directory
const TOKEN_FILE: &str = "token.json";

/// Read/clear access to the stored API token
///
/// Abstracts over different backends so the session logic can be tested
/// without touching the filesystem.
pub trait CredentialStore: Send + Sync {
    /// Current token, if any
    fn get(&self) -> Option<String>;

    /// Persist a new token
    fn set(&self, token: &str) -> Result<()>;

    /// Drop the stored token (logout or auth failure)
    fn clear(&self) -> Result<()>;
}

/// On-disk token format
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// File-backed token store (~/.config/sellup/token.json)
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at the default config location
    pub fn new() -> Result<Self> {
        let path = config::config_path(TOKEN_FILE)
            .context("Could not determine config directory")?;
        Ok(Self { path })
    }

    /// Create a store at an explicit path
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<StoredToken> {
        let content = fs::read_to_string(&self.path)?;
        let stored: StoredToken = serde_json::from_str(&content)?;
        Ok(stored)
    }
}

impl CredentialStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.load().ok().map(|s| s.token)
    }

    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredToken {
            token: token.to_string(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove token file: {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-memory token store for tests and embedding
pub struct InMemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CredentialStore for InMemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}
