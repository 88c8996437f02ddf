use std::fs::File;
use std::path::Path;

use lofty::{AudioFile, Probe};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{BzError, Result};

/// Reads the duration of a finished audio file
pub trait DurationProbe {
    /// Duration in seconds
    fn duration_secs(&self, path: &Path) -> Result<f64>;
}

/// Header-only duration probe.
///
/// Uses the frame count from Symphonia's container probe; when the container
/// does not report one, falls back to lofty's stream properties. Nothing is
/// decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProbe;

impl DurationProbe for SymphoniaProbe {
    fn duration_secs(&self, path: &Path) -> Result<f64> {
        match symphonia_duration(path) {
            Ok(Some(secs)) => Ok(secs),
            Ok(None) => lofty_duration(path),
            Err(e) => {
                log::debug!("Symphonia could not probe {:?}: {}", path, e);
                lofty_duration(path)
            }
        }
    }
}

/// Duration from the container header, `None` if the frame count is unknown
fn symphonia_duration(path: &Path) -> Result<Option<f64>> {
    let file = File::open(path).map_err(|e| BzError::probe(format!("Failed to open file: {}", e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| BzError::probe(format!("Failed to probe audio format: {}", e)))?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| BzError::probe("No default track found"))?;

    let params = &track.codec_params;
    match (params.n_frames, params.sample_rate) {
        (Some(n_frames), Some(sample_rate)) if n_frames > 0 && sample_rate > 0 => {
            Ok(Some(n_frames as f64 / sample_rate as f64))
        }
        _ => Ok(None),
    }
}

fn lofty_duration(path: &Path) -> Result<f64> {
    let tagged_file = Probe::open(path)
        .map_err(|e| BzError::probe(format!("Failed to open file: {}", e)))?
        .read()
        .map_err(|e| BzError::probe(format!("Failed to read file: {}", e)))?;

    let duration = tagged_file.properties().duration();
    if duration.is_zero() {
        return Err(BzError::probe("File reports no duration"));
    }
    Ok(duration.as_secs_f64())
}

/// Round seconds to millisecond precision
pub fn round_to_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
