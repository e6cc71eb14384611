use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::domain::edit_history::DEFAULT_HISTORY_LIMIT;
use crate::waveform::domain::region::RegionPalette;

use super::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEGMENT_DURATION,
    SETTINGS_DIR_NAME, SETTINGS_FILE_NAME,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("no platform config directory available")]
    NoConfigDir,
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub default_segment_duration: f64,
    pub palette: RegionPalette,
    pub history_limit: usize,
    pub read_only: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_segment_duration: DEFAULT_SEGMENT_DURATION,
            palette: RegionPalette::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            read_only: false,
        }
    }
}

impl EditorSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Loads from the platform config dir. Missing or unreadable files
    /// yield defaults.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .ok()
            .and_then(|json| match serde_json::from_str::<Self>(&json) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("ignoring corrupt settings at {}: {e}", path.display());
                    None
                }
            });
        parsed.unwrap_or_default().normalized()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        let base = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if base.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            base.to_string()
        };
        self.api_token = self.api_token.filter(|t| !t.trim().is_empty());
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if !self.default_segment_duration.is_finite() || self.default_segment_duration <= 0.0 {
            self.default_segment_duration = DEFAULT_SEGMENT_DURATION;
        }
        if self.history_limit == 0 {
            self.history_limit = DEFAULT_HISTORY_LIMIT;
        }
        self
    }
}
