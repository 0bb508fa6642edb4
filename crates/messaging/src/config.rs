//! Configuration loading for the messaging client
//!
//! Supports loading the API endpoint from (in order of priority):
//! 1. Runtime environment variable (`SELLUP_API_URL`)
//! 2. JSON file (~/.config/sellup/client.json)
//! 3. Built-in development default

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;

/// Client config filename in the SellUp config directory
const CLIENT_CONFIG_FILE: &str = "client.json";

/// Where the client talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root, e.g. `https://sellup.example.com/api`
    pub api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load the client configuration using the priority above
    pub fn load() -> Result<Self> {
        if let Ok(api_url) = std::env::var("SELLUP_API_URL") {
            return Ok(Self { api_url });
        }

        if config::config_exists(CLIENT_CONFIG_FILE) {
            return config::load_json(CLIENT_CONFIG_FILE);
        }

        Ok(Self::default())
    }

    /// Persist to ~/.config/sellup/client.json
    pub fn save(&self) -> Result<()> {
        config::save_json(CLIENT_CONFIG_FILE, self)
    }
}
