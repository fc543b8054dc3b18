//! Application configuration
//!
//! Loaded from `<config dir>/chatview/config.json`. A missing file yields the
//! defaults; `CHATVIEW_SERVER_URL` and `CHATVIEW_DATA_DIR` override the file.

use crate::error::{Error, Result};
use crate::panel::DEFAULT_PANEL_WIDTH;
use crate::preview::render::DEFAULT_IMAGE_MAX_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SERVER_URL_ENV: &str = "CHATVIEW_SERVER_URL";
pub const DATA_DIR_ENV: &str = "CHATVIEW_DATA_DIR";

/// Theme choice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSetting {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Base URL of the chat backend (token exchange, CSRF)
    pub server_url: String,
    pub initial_panel_width: f32,
    /// Start sandboxed previews without pressing "run"
    pub auto_run_previews: bool,
    /// Fixed width cap for inline images
    pub image_max_width: f32,
    pub data_dir: PathBuf,
    /// Transcript (JSON array of chat messages) to show on startup
    pub transcript_path: Option<PathBuf>,
    pub theme: ThemeSetting,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5001".to_string(),
            initial_panel_width: DEFAULT_PANEL_WIDTH,
            auto_run_previews: false,
            image_max_width: DEFAULT_IMAGE_MAX_WIDTH,
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chatview"),
            transcript_path: None,
            theme: ThemeSetting::default(),
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chatview").join("config.json"))
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file; a missing file gives the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!(?path, "loaded configuration");
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|v| !v.is_empty()) {
            self.server_url = url;
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Server URL without a trailing slash
    pub fn server_base(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}
