//! Runtime configuration
//!
//! Optional TOML file read from `$SILENTRISK_CONFIG` or
//! `<config dir>/silentrisk/config.toml`. A missing file means defaults; a
//! file that cannot be read or parsed is logged and ignored.
//!
//! ```toml
//! storage_dir = "/home/me/.local/share/silentrisk"
//! storage_key = "silentrisk-state"
//! log_filter = "silentrisk=debug"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::CheckinError;
use crate::storage::DEFAULT_STORAGE_KEY;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "SILENTRISK_CONFIG";

/// Application directory name under the platform config/data dirs
pub const APP_DIR: &str = "silentrisk";

/// Log filter used when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the session record
    pub storage_dir: Option<PathBuf>,
    /// Key (file stem) of the session record
    pub storage_key: Option<String>,
    /// `tracing` filter directive
    pub log_filter: Option<String>,
}

impl Config {
    /// Parse a config document
    pub fn from_toml(content: &str) -> Result<Self, CheckinError> {
        toml::from_str(content).map_err(|e| CheckinError::ConfigError(e.to_string()))
    }

    /// Read and parse `path`
    pub fn from_path(path: &Path) -> Result<Self, CheckinError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match Self::from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to load config at {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    /// Config file location: `$SILENTRISK_CONFIG`, else the platform config dir
    pub fn path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Resolved storage directory: configured, else the platform data dir, else `./.silentrisk`
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".silentrisk"))
    }

    pub fn storage_key(&self) -> &str {
        self.storage_key.as_deref().unwrap_or(DEFAULT_STORAGE_KEY)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
