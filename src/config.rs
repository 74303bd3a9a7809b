//! Server configuration
//!
//! Configuration is an explicit value loaded from a JSON file (with
//! environment overrides) and handed to [`crate::AppState`] by reference,
//! rather than living in a module global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::DEFAULT_PORT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Data directory (database lives here)
    pub data_dir: PathBuf,

    /// Secret used to sign bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub token_ttl_hours: i64,

    /// Chromium binary used for PDF export
    pub chromium_path: String,

    /// Timeout for a single PDF render, in seconds
    pub pdf_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wikid"),
            jwt_secret: generate_secret(),
            token_ttl_hours: 24,
            chromium_path: "chromium".to_string(),
            pdf_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wikid")
            .join("config.json")
    }

    /// Load configuration from a file, creating it with defaults if missing.
    /// Environment variables override file values afterwards.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            let config = Self::default();
            config.save(path)?;
            config
        };

        if let Ok(port) = std::env::var("WIKID_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        if let Ok(dir) = std::env::var("WIKID_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(secret) = std::env::var("WIKID_JWT_SECRET") {
            config.jwt_secret = secret;
        }
        if let Ok(path) = std::env::var("WIKID_CHROMIUM") {
            config.chromium_path = path;
        }

        Ok(config)
    }

    /// Write configuration back to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Generate a random signing secret for first-run configs
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::Rng::gen(&mut rand::thread_rng());
    hex::encode(bytes)
}
