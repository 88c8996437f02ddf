//! FFmpeg subprocess handling

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Serialize;

use super::command::EngineCommand;

/// Result of converting one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    /// Original input file path
    pub input_path: PathBuf,
    /// Path the converted file was written to
    pub output_path: PathBuf,
    /// Whether conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
}

impl JobResult {
    pub fn succeeded(input_path: &Path, output_path: &Path) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            success: true,
            error: None,
        }
    }

    pub fn failed(input_path: &Path, output_path: &Path, error: impl Into<String>) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            success: false,
            error: Some(error.into()),
        }
    }

    /// File name of the input, for progress and log lines
    pub fn input_name(&self) -> String {
        file_display_name(&self.input_path)
    }
}

pub(crate) fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Executes a prepared argument list.
///
/// `Err` carries the captured error detail (exit status plus stderr tail, or
/// the spawn failure).
pub trait MediaEngine: Send + Sync {
    fn run(&self, command: &EngineCommand) -> Result<(), String>;
}

/// Runs the real ffmpeg binary and waits for it to exit
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_path: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl MediaEngine for FfmpegEngine {
    fn run(&self, command: &EngineCommand) -> Result<(), String> {
        log::debug!(
            "Running {} {}",
            self.ffmpeg_path.display(),
            command.to_strings().join(" ")
        );

        let result = Command::new(&self.ffmpeg_path)
            .args(command.as_args())
            .output();

        handle_ffmpeg_result(result)
    }
}

/// Number of trailing stderr lines kept in an error message
const STDERR_TAIL_LINES: usize = 3;

/// Turn the process outcome into `Ok` or an error detail string
fn handle_ffmpeg_result(result: std::io::Result<Output>) -> Result<(), String> {
    match result {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            Err(format!("ffmpeg failed ({}): {}", status, stderr_tail(&stderr)))
        }
        Err(e) => Err(format!("Failed to spawn ffmpeg: {}", e)),
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "Unknown error".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
