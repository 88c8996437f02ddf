//! Persisted defaults
//!
//! Settings live at `<config dir>/BZRadio/settings.json`. A missing or
//! unreadable file is never fatal: the defaults are used instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::params::ProcessingParameters;
use crate::error::{BzError, Result};

/// Defaults remembered between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Parameters used when the caller does not override them
    pub parameters: ProcessingParameters,
    /// Explicit ffmpeg binary, bypassing the bundled/PATH lookup
    pub ffmpeg_path: Option<PathBuf>,
    /// Directory holding `commbeep.wav` and `unitbeep.wav`
    pub assets_dir: Option<PathBuf>,
}

impl Settings {
    const SETTINGS_FILE: &'static str = "settings.json";

    /// Get the app config directory, creating it if needed
    fn get_app_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BzError::Settings("Could not determine config directory".to_string()))?;

        let app_dir = config_dir.join("BZRadio");

        if !app_dir.exists() {
            std::fs::create_dir_all(&app_dir).map_err(|e| {
                BzError::Settings(format!("Failed to create config directory: {}", e))
            })?;
        }

        Ok(app_dir)
    }

    /// Path of the settings file in the user's config directory
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::get_app_config_dir()?.join(Self::SETTINGS_FILE))
    }

    /// Load settings from the user's config directory, or return defaults
    pub fn load() -> Self {
        match Self::default_path().and_then(|p| Self::load_from(&p)) {
            Ok(settings) => {
                log::debug!("Loaded settings from disk");
                settings
            }
            Err(e) => {
                log::debug!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BzError::Settings("Settings file not found".to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| BzError::Settings(format!("Failed to read settings: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| BzError::Settings(format!("Failed to parse settings: {}", e)))
    }

    /// Save settings to the user's config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BzError::Settings(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| BzError::Settings(format!("Failed to write settings: {}", e)))?;

        log::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}
