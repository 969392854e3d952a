pub mod bridge_config;

use std::path::Path;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;
use crate::utils::ensure_directory_exists;

pub use bridge_config::BridgeConfig;

pub const DEFAULT_CONFIG_FILE: &str = "pantabox_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    /// One of error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bridge: BridgeConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config from a configuration file.
    pub async fn load_config(file_path: &Path) -> Result<Self> {
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !fs::try_exists(file_path).await? {
            warn!("Config file not found at {:?}, using default.", file_path_str);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;
        config.bridge.validate()?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the current config to a configuration file.
    pub async fn save_config(&self, file_path: &Path) -> Result<()> {
        if let Some(config_dir) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory_exists(config_dir).await?;
        }
        let file_path_str = file_path.to_string_lossy().into_owned();

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path, config_json).await?;
        info!("Config saved to {:?}.", file_path_str);
        Ok(())
    }

    /// Writes a default config to `file_path` unless one already exists.
    /// Returns whether a file was written.
    pub async fn init_config(file_path: &Path) -> Result<bool> {
        if fs::try_exists(file_path).await? {
            info!("Config already exists at {:?}, leaving it untouched.", file_path);
            return Ok(false);
        }
        Self::default().save_config(file_path).await?;
        Ok(true)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
