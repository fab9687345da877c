//! Configuration manager for loading and saving application configuration
//!
//! Configuration lives in `<config dir>/GameWatch/config.json` and is written
//! atomically to prevent corruption.

use crate::config::models::{AppConfig, MonitorConfig};
use crate::error::{GameWatchError, Result, StringError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the per-user data directory
const APP_DIR_NAME: &str = "GameWatch";

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Directory holding the config file, tool log and event log
    ///
    /// Uses `%APPDATA%` when set, then the platform config directory, then the
    /// current directory.
    pub fn data_dir() -> PathBuf {
        let base = std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(APP_DIR_NAME)
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<AppConfig> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from `path`
    ///
    /// If the file doesn't exist or is corrupt, returns the default configuration.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            info!("Configuration file not found, using defaults");
            return Ok(AppConfig::default());
        }

        let json = std::fs::read_to_string(path)?;

        match serde_json::from_str::<AppConfig>(&json) {
            Ok(mut config) => {
                if let Err(e) = config.monitor.validate() {
                    warn!("Invalid monitor settings, using defaults: {}", e);
                    config.monitor = MonitorConfig::default();
                }
                if let Err(e) = config.validate_host_metrics_interval() {
                    warn!("Invalid host metrics interval, using default: {}", e);
                    config.host_metrics_interval_ms = AppConfig::default().host_metrics_interval_ms;
                }
                info!("Configuration loaded from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse configuration, using defaults: {}", e);
                Ok(AppConfig::default())
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(config: &AppConfig) -> Result<()> {
        Self::save_to(config, &Self::get_config_path())
    }

    /// Save configuration to `path` with an atomic write
    ///
    /// Writes into a temporary file in the same directory, then persists it over the target.
    pub fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
        let config_dir = path.parent().ok_or_else(|| {
            GameWatchError::ConfigError(StringError::new("Invalid config path"))
        })?;
        std::fs::create_dir_all(config_dir)?;

        let json = serde_json::to_string_pretty(config)?;
        let mut temp = tempfile::NamedTempFile::new_in(config_dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(path)
            .map_err(|e| GameWatchError::ConfigError(Box::new(e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}
