//! Processing parameters and output modes
//!
//! `ProcessingParameters` is an immutable snapshot built once per batch and
//! handed to the runner. Nothing reads UI state while a batch is in flight.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BzError, Result};

/// Smallest accepted echo delay in milliseconds
pub const ECHO_DELAY_MIN_MS: u32 = 10;
/// Largest accepted echo delay in milliseconds
pub const ECHO_DELAY_MAX_MS: u32 = 100;
/// Highest Vorbis quality level accepted by `-q:a`
pub const MUSIC_QUALITY_MAX: u8 = 10;

/// Severity of the radio effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    None,
    Light,
    #[default]
    Medium,
    Heavy,
}

impl std::str::FromStr for Intensity {
    type Err = BzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Intensity::None),
            "light" => Ok(Intensity::Light),
            "medium" => Ok(Intensity::Medium),
            "heavy" => Ok(Intensity::Heavy),
            other => Err(BzError::config(format!("Unknown intensity '{}'", other))),
        }
    }
}

/// Which tone (if any) bookends a voice line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeepChoice {
    /// Bundled `commbeep.wav` (radio/orders)
    #[default]
    Comm,
    /// Bundled `unitbeep.wav` (unit responses)
    Unit,
    /// A user-supplied WAV. A missing or empty path falls back to no beep.
    Custom(Option<PathBuf>),
    None,
}

/// Where the beep for a batch actually comes from after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeepSource {
    /// A concrete WAV file to bookend every voice line with
    File(PathBuf),
    /// No beep was requested
    Disabled,
    /// A custom beep was requested without a usable path; treated as no beep
    Fallback,
}

impl BeepSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            BeepSource::File(p) => Some(p),
            BeepSource::Disabled | BeepSource::Fallback => None,
        }
    }
}

/// Locations of the two bundled beep tones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeepAssets {
    pub comm: PathBuf,
    pub unit: PathBuf,
}

impl BeepChoice {
    /// Resolve the choice to a concrete file.
    ///
    /// `Custom` without a non-empty path resolves to `BeepSource::Fallback`
    /// rather than an error, so the batch proceeds without a beep.
    pub fn resolve(&self, assets: &BeepAssets) -> BeepSource {
        match self {
            BeepChoice::Comm => BeepSource::File(assets.comm.clone()),
            BeepChoice::Unit => BeepSource::File(assets.unit.clone()),
            BeepChoice::Custom(Some(path)) if !path.as_os_str().is_empty() => {
                BeepSource::File(path.clone())
            }
            BeepChoice::Custom(_) => BeepSource::Fallback,
            BeepChoice::None => BeepSource::Disabled,
        }
    }
}

/// Output target for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Radio-processed voice: 8-bit unsigned PCM, mono, 22050 Hz WAV
    Voice,
    /// Clean music: Vorbis, stereo, 44100 Hz OGG
    Music,
}

impl Mode {
    pub fn extension(&self) -> &'static str {
        match self {
            Mode::Voice => "wav",
            Mode::Music => "ogg",
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Mode::Voice => 22050,
            Mode::Music => 44100,
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            Mode::Voice => 1,
            Mode::Music => 2,
        }
    }

    pub fn codec(&self) -> &'static str {
        match self {
            Mode::Voice => "pcm_u8",
            Mode::Music => "libvorbis",
        }
    }

    /// Name of the subfolder created next to the inputs
    pub fn export_folder(&self) -> &'static str {
        match self {
            Mode::Voice => "bz98_radio_export",
            Mode::Music => "bz98_music_export",
        }
    }

    /// Whether the radio filter chain applies in this mode
    pub fn applies_filters(&self) -> bool {
        matches!(self, Mode::Voice)
    }
}

/// User-selected settings for one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParameters {
    pub intensity: Intensity,
    /// Drop container metadata and any cover-art stream
    pub strip_metadata: bool,
    pub beep: BeepChoice,
    pub phaser_enabled: bool,
    pub echo_enabled: bool,
    /// Only used when `echo_enabled` is set
    pub echo_delay_ms: u32,
    /// Vorbis quality for music mode (0-10)
    pub music_quality: u8,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            intensity: Intensity::Medium,
            strip_metadata: true,
            beep: BeepChoice::Comm,
            phaser_enabled: false,
            echo_enabled: false,
            echo_delay_ms: 50,
            music_quality: 5,
        }
    }
}

impl ProcessingParameters {
    /// Check ranges that the builder relies on
    pub fn validate(&self) -> Result<()> {
        if self.echo_enabled
            && !(ECHO_DELAY_MIN_MS..=ECHO_DELAY_MAX_MS).contains(&self.echo_delay_ms)
        {
            return Err(BzError::config(format!(
                "Echo delay must be between {} and {} ms, got {}",
                ECHO_DELAY_MIN_MS, ECHO_DELAY_MAX_MS, self.echo_delay_ms
            )));
        }
        if self.music_quality > MUSIC_QUALITY_MAX {
            return Err(BzError::config(format!(
                "Music quality must be between 0 and {}, got {}",
                MUSIC_QUALITY_MAX, self.music_quality
            )));
        }
        Ok(())
    }

    /// Echo delay if echo is switched on
    pub fn echo_delay(&self) -> Option<u32> {
        self.echo_enabled.then_some(self.echo_delay_ms)
    }
}
