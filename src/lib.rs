//! BZRadio - Battlezone 98 Redux audio tool
//!
//! Batch-converts voice lines into radio-filtered 8-bit mono WAV, music into
//! stereo OGG, and exports a CSV manifest of output durations. All audio
//! work is delegated to ffmpeg.

pub mod audio;
pub mod conversion;
pub mod core;
pub mod error;
pub mod logging;
pub mod manifest;

mod test_fixtures;

pub use error::{BzError, Result};
