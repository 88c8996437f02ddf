//! Test fixtures for conversion and manifest tests
//!
//! Nothing here needs a real ffmpeg: WAV files are written byte by byte and
//! the media engine is scripted.

#![cfg(test)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::audio::DurationProbe;
use crate::conversion::{EngineCommand, MediaEngine};
use crate::core::BeepAssets;
use crate::error::{BzError, Result};

/// Beep assets at fixed fake paths
pub fn test_assets() -> BeepAssets {
    BeepAssets {
        comm: PathBuf::from("/res/commbeep.wav"),
        unit: PathBuf::from("/res/unitbeep.wav"),
    }
}

/// Write an 8-bit unsigned mono PCM WAV of `frames` samples of silence
pub fn write_pcm_wav(path: &Path, sample_rate: u32, frames: u32) {
    let data_len = frames;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes()); // byte rate
    bytes.extend_from_slice(&1u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&8u16.to_le_bytes()); // bits per sample

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(bytes.len() + data_len as usize, 0x80);

    std::fs::write(path, bytes).expect("Failed to write test WAV");
}

/// Media engine that records every command and fails for chosen inputs
pub struct ScriptedEngine {
    fail_names: Vec<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn succeeding() -> Self {
        Self::failing_on(&[])
    }

    /// Fail any command with an `-i` input whose file name is in `names`
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|n| n.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl MediaEngine for ScriptedEngine {
    fn run(&self, command: &EngineCommand) -> std::result::Result<(), String> {
        self.calls.lock().unwrap().push(command.to_strings());

        let failing = command.inputs().into_iter().find(|input| {
            let name = Path::new(input)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.fail_names.contains(&name)
        });

        match failing {
            Some(input) => Err(format!(
                "ffmpeg failed (exit code 1): {}: Invalid data found when processing input",
                input
            )),
            None => Ok(()),
        }
    }
}

/// Shell script standing in for ffmpeg.
///
/// Exits 1 with an ffmpeg-style stderr message when any argument ends with
/// `failing_name`, and exits 0 otherwise without writing output.
#[cfg(unix)]
pub fn write_fake_ffmpeg(dir: &Path, failing_name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        "#!/bin/sh\n\
         for arg in \"$@\"; do\n\
           case \"$arg\" in\n\
             *{name}) echo \"ffmpeg version n6.1\" >&2; echo \"$arg: Invalid data found when processing input\" >&2; exit 1 ;;\n\
           esac\n\
         done\n\
         exit 0\n",
        name = failing_name
    );

    let path = dir.join("ffmpeg");
    std::fs::write(&path, script).expect("Failed to write fake ffmpeg");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake ffmpeg executable");
    path
}

/// Duration probe answering from a fixed table keyed by file name
pub struct FixedProbe {
    durations: HashMap<String, f64>,
}

impl FixedProbe {
    pub fn new(entries: &[(&str, f64)]) -> Self {
        Self {
            durations: entries
                .iter()
                .map(|(name, secs)| (name.to_string(), *secs))
                .collect(),
        }
    }
}

impl DurationProbe for FixedProbe {
    fn duration_secs(&self, path: &Path) -> Result<f64> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.durations
            .get(&name)
            .copied()
            .ok_or_else(|| BzError::probe(format!("Unreadable header: {}", name)))
    }
}
