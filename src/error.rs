//! Error types shared across the crate

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop an operation before or during a batch.
///
/// Per-file ffmpeg failures are not represented here; they are recorded in
/// the file's `JobResult` and the batch carries on.
#[derive(Debug, Error)]
pub enum BzError {
    /// Bad or missing input from the caller (no files, bad parameters, no ffmpeg)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The batch output directory could not be created
    #[error("Failed to create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single file could not be probed for its duration
    #[error("Probe error: {0}")]
    Probe(String),

    /// The manifest could not be written
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// The background batch thread died before reporting
    #[error("Batch worker failed: {0}")]
    Worker(String),

    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BzError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn probe<S: Into<String>>(msg: S) -> Self {
        Self::Probe(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let e = BzError::config("no input files");
        assert_eq!(e.to_string(), "Configuration error: no input files");
    }

    #[test]
    fn test_output_dir_error_keeps_source() {
        let e = BzError::OutputDir {
            path: PathBuf::from("/nope/bz98_radio_export"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("bz98_radio_export"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
