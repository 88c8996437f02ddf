//! Audio conversion module
//!
//! Builds ffmpeg invocations for voice and music batches and runs them.

mod background;
mod batch;
mod command;
mod ffmpeg;
mod filters;

pub use background::{BatchEvent, BatchWorker};
pub use batch::{
    default_output_dir, output_path_for, BatchJob, BatchOutcome, BatchProgress, BatchReport,
    BatchRunner,
};
pub use command::{build_command, EngineCommand};
pub use ffmpeg::{FfmpegEngine, JobResult, MediaEngine};
pub use filters::{beep_concat_graph, CompressionCurve, FilterChain, FilterStage, RadioPreset};

use std::path::{Path, PathBuf};

use crate::core::BeepAssets;
use crate::error::{BzError, Result};

const COMM_BEEP_FILE: &str = "commbeep.wav";
const UNIT_BEEP_FILE: &str = "unitbeep.wav";

fn ffmpeg_binary_name() -> &'static str {
    if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" }
}

/// Candidate `resources` directories, most specific first:
/// `CARGO_MANIFEST_DIR/resources` in development, then next to the executable
/// (and `../Resources` for a macOS bundle).
fn resource_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        roots.push(PathBuf::from(manifest_dir).join("resources"));
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        roots.push(exe_dir.join("resources"));
        roots.push(exe_dir.join("..").join("Resources"));
    }

    roots
}

/// Find the ffmpeg binary.
///
/// Order: explicit override, bundled `resources/bin/ffmpeg`, then `PATH`.
pub fn get_ffmpeg_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if path.exists() {
            log::debug!("Using configured ffmpeg at {:?}", path);
            return Ok(path.to_path_buf());
        }
        return Err(BzError::config(format!(
            "Configured ffmpeg not found at {:?}",
            path
        )));
    }

    for root in resource_roots() {
        let bundled = root.join("bin").join(ffmpeg_binary_name());
        if bundled.exists() {
            log::debug!("Found bundled ffmpeg at {:?}", bundled);
            return Ok(bundled);
        }
    }

    which::which("ffmpeg").map_err(|_| {
        BzError::config("ffmpeg binary not found. Expected at resources/bin/ffmpeg or on PATH")
    })
}

/// Verify that ffmpeg exists and is executable
pub fn verify_ffmpeg(override_path: Option<&Path>) -> Result<PathBuf> {
    let path = get_ffmpeg_path(override_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(&path)
            .map_err(|e| BzError::config(format!("Failed to get ffmpeg metadata: {}", e)))?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(BzError::config(format!("ffmpeg at {:?} is not executable", path)));
        }
    }

    log::info!("ffmpeg verified at: {}", path.display());
    Ok(path)
}

/// Locate the bundled beep tones.
///
/// With `assets_dir` set, both files are expected there. Otherwise the first
/// `resources/sounds` directory holding `commbeep.wav` wins. Missing files are
/// not checked here; ffmpeg reports them per file.
pub fn locate_beep_assets(assets_dir: Option<&Path>) -> BeepAssets {
    let dir = match assets_dir {
        Some(dir) => dir.to_path_buf(),
        None => resource_roots()
            .into_iter()
            .map(|root| root.join("sounds"))
            .find(|dir| dir.join(COMM_BEEP_FILE).exists())
            .unwrap_or_else(|| PathBuf::from("resources").join("sounds")),
    };

    BeepAssets {
        comm: dir.join(COMM_BEEP_FILE),
        unit: dir.join(UNIT_BEEP_FILE),
    }
}
