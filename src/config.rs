//! Configuration file handling for longcat-studio.
//!
//! Loads configuration from `<config dir>/longcat-studio/config.toml` or a
//! custom path given with `--config`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::fal::{FalSettings, FAL_API_BASE_URL, IMAGE_TO_VIDEO_ENDPOINT, TEXT_TO_VIDEO_ENDPOINT};

/// Default address the UI server listens on.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Default upload size limit (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fal: FalConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FalConfig {
    pub base_url: String,
    pub text_to_video_endpoint: String,
    pub image_to_video_endpoint: String,
    pub request_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for FalConfig {
    fn default() -> Self {
        let settings = FalSettings::default();
        Self {
            base_url: FAL_API_BASE_URL.to_string(),
            text_to_video_endpoint: TEXT_TO_VIDEO_ENDPOINT.to_string(),
            image_to_video_endpoint: IMAGE_TO_VIDEO_ENDPOINT.to_string(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            generation_timeout_secs: settings.generation_timeout.as_secs(),
            poll_interval_ms: settings.poll_interval.as_millis() as u64,
        }
    }
}

impl FalConfig {
    pub fn settings(&self) -> FalSettings {
        FalSettings {
            base_url: self.base_url.clone(),
            text_to_video_endpoint: self.text_to_video_endpoint.clone(),
            image_to_video_endpoint: self.image_to_video_endpoint.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            generation_timeout: Duration::from_secs(self.generation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8501))
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_file(path)
            }
            None => match default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("longcat-studio").join("config.toml"))
}
