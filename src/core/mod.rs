//! Core data model
//!
//! This module contains:
//! - Processing parameters, beep selection and output modes
//! - Persisted settings

mod params;
mod settings;

pub use params::{
    BeepAssets, BeepChoice, BeepSource, Intensity, Mode, ProcessingParameters,
    ECHO_DELAY_MAX_MS, ECHO_DELAY_MIN_MS, MUSIC_QUALITY_MAX,
};
pub use settings::Settings;
