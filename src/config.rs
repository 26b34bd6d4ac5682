use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants;

const APP_DIR: &str = "video-player";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub favorites: FavoritesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,

    #[serde(default = "default_controls_hide_secs")]
    pub controls_hide_secs: u64,

    #[serde(default = "default_skip_interval_secs")]
    pub skip_interval_secs: f64,

    #[serde(default = "default_seek_timeout_ms")]
    pub seek_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_latency_ms")]
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    #[serde(default = "default_favorites_file")]
    pub file_name: String,
}

impl Config {
    /// Loads the user config, writing the defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    /// Where the favorites store lives.
    pub fn favorites_path(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Ok(data_dir.join(APP_DIR).join(&self.favorites.file_name))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }
}

impl PlaybackConfig {
    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms.max(1))
    }

    pub fn controls_timeout(&self) -> Duration {
        Duration::from_secs(self.controls_hide_secs)
    }

    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }
}

impl CatalogConfig {
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            position_interval_ms: default_position_interval_ms(),
            controls_hide_secs: default_controls_hide_secs(),
            skip_interval_secs: default_skip_interval_secs(),
            seek_timeout_ms: default_seek_timeout_ms(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: default_catalog_latency_ms(),
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            file_name: default_favorites_file(),
        }
    }
}

// Default value functions
fn default_position_interval_ms() -> u64 { constants::POSITION_INTERVAL_MS }
fn default_controls_hide_secs() -> u64 { constants::CONTROLS_HIDE_SECS }
fn default_skip_interval_secs() -> f64 { constants::SKIP_INTERVAL_SECS }
fn default_seek_timeout_ms() -> u64 { constants::SEEK_TIMEOUT_MS }
fn default_catalog_latency_ms() -> u64 { constants::CATALOG_LATENCY_MS }
fn default_favorites_file() -> String { constants::FAVORITES_FILE_NAME.to_string() }
