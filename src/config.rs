//! Application configuration.
//!
//! Read once at startup from `config.toml` in the app's config directory.
//! A missing or unparseable file falls back to defaults; config problems are
//! logged, never fatal.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default API base, matching the development backend.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote bug service.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Collector endpoint for error telemetry. Log-only when unset.
    #[serde(default)]
    pub telemetry_endpoint: Option<String>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            telemetry_endpoint: None,
        }
    }
}

impl AppConfig {
    /// Load from `<config_dir>/config.toml`, defaulting when absent.
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("No config at {:?}, using defaults", path);
                Self::default()
            }
        }
    }
}

/// Per-user directory for config, session credential and theme preference.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bug-studio")
}
