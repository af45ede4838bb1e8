//! Session credential persistence.
//!
//! The credential is one opaque string kept in a fixed file under the app's
//! config directory; the file being absent means unauthenticated. It is an
//! explicit value handed to whoever needs it, never a process-wide global.

use std::path::{Path, PathBuf};

const TOKEN_FILE: &str = "token";

pub struct Session {
    path: PathBuf,
    token: Option<String>,
}

impl Session {
    /// Load the persisted credential, if any, from `config_dir`.
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(TOKEN_FILE);
        let token = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    log::info!("Loaded session credential");
                    Some(trimmed.to_string())
                }
            }
            Err(_) => None,
        };
        Self { path, token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store a new credential and persist it. A write failure keeps the
    /// in-memory credential usable for this run.
    pub fn save(&mut self, token: String) {
        if let Some(dir) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::warn!("Failed to create config dir: {}", e);
            }
        }
        if let Err(e) = std::fs::write(&self.path, token.as_bytes()) {
            log::warn!("Failed to persist session credential: {}", e);
        }
        self.token = Some(token);
    }

    /// Forget the credential and remove the persisted copy.
    pub fn clear(&mut self) {
        self.token = None;
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::warn!("Failed to remove session credential: {}", e);
            }
        }
    }
}
