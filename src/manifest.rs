//! CSV timing manifest
//!
//! Lists every converted WAV/OGG in a folder with its duration so mission
//! scripts can line up subtitles and events. Files that cannot be probed are
//! skipped. The CSV itself is written all-or-nothing.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::audio::{manifest_type, round_to_millis, DurationProbe};
use crate::error::{BzError, Result};

/// Default manifest file name
pub const DEFAULT_MANIFEST_NAME: &str = "audio_manifest.csv";

const HEADER: [&str; 3] = ["Filename", "Duration", "Type"];

/// One line of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub filename: String,
    /// Seconds, rounded to milliseconds
    pub duration: f64,
    /// `WAV` or `OGG`
    pub file_type: &'static str,
}

/// Probe every WAV/OGG directly inside `dir`, in directory listing order
pub fn scan_outputs(dir: &Path, probe: &dyn DurationProbe) -> Result<Vec<ManifestRow>> {
    if !dir.is_dir() {
        return Err(BzError::config(format!("Not a directory: {}", dir.display())));
    }

    let mut rows = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(file_type) = manifest_type(path) else {
            continue;
        };

        match probe.duration_secs(path) {
            Ok(secs) => rows.push(ManifestRow {
                filename: entry.file_name().to_string_lossy().into_owned(),
                duration: round_to_millis(secs),
                file_type,
            }),
            Err(e) => log::debug!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(rows)
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Seconds with at least one decimal place (`10.0`, `2.501`)
fn format_duration(secs: f64) -> String {
    format!("{:?}", secs)
}

/// Render the full CSV document
pub fn render_csv(rows: &[ManifestRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", HEADER.join(","));
    for row in rows {
        let _ = writeln!(
            out,
            "{},{},{}",
            csv_field(&row.filename),
            format_duration(row.duration),
            row.file_type
        );
    }
    out
}

/// Write `rows` to `dest`.
///
/// The CSV goes to a temporary file beside `dest` and replaces it only once
/// every byte is written; on any error the temporary file is removed and
/// `dest` is left untouched.
pub fn write_manifest(rows: &[ManifestRow], dest: &Path) -> Result<()> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".manifest")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(|e| BzError::Manifest(format!("Cannot write to {}: {}", parent.display(), e)))?;

    tmp.write_all(render_csv(rows).as_bytes())?;
    tmp.as_file().sync_all()?;

    tmp.persist(dest)
        .map_err(|e| BzError::Manifest(format!("Failed to save {}: {}", dest.display(), e.error)))?;

    log::info!("Manifest saved: {} ({} files)", dest.display(), rows.len());
    Ok(())
}

/// Scan `dir` and write the manifest to `dest`, returning the rows written
pub fn export_manifest(dir: &Path, dest: &Path, probe: &dyn DurationProbe) -> Result<Vec<ManifestRow>> {
    let rows = scan_outputs(dir, probe)?;
    write_manifest(&rows, dest)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SymphoniaProbe;
    use crate::test_fixtures::{write_pcm_wav, FixedProbe};

    #[test]
    fn test_scan_lists_only_wav_and_ogg() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.wav", "b.ogg", "c.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let probe = FixedProbe::new(&[("a.wav", 2.501), ("b.ogg", 10.0)]);

        let mut rows = scan_outputs(dir.path(), &probe).unwrap();
        rows.sort_by(|a, b| a.filename.cmp(&b.filename));

        assert_eq!(
            rows,
            vec![
                ManifestRow { filename: "a.wav".into(), duration: 2.501, file_type: "WAV" },
                ManifestRow { filename: "b.ogg".into(), duration: 10.0, file_type: "OGG" },
            ]
        );
    }

    #[test]
    fn test_probe_failure_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["good.wav", "bad.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        // FixedProbe fails for names it does not know
        let probe = FixedProbe::new(&[("good.wav", 1.0)]);

        let rows = scan_outputs(dir.path(), &probe).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename, "good.wav");
    }

    #[test]
    fn test_scan_real_wav_headers() {
        let dir = tempfile::tempdir().unwrap();
        write_pcm_wav(&dir.path().join("a.wav"), 8000, 20008);
        std::fs::write(dir.path().join("corrupt.wav"), b"RIFF????").unwrap();

        let rows = scan_outputs(dir.path(), &SymphoniaProbe).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename, "a.wav");
        assert_eq!(rows[0].duration, 2.501);
    }

    #[test]
    fn test_render_csv_matches_expected_layout() {
        let rows = vec![
            ManifestRow { filename: "a.wav".into(), duration: 2.501, file_type: "WAV" },
            ManifestRow { filename: "b.ogg".into(), duration: 10.0, file_type: "OGG" },
        ];
        assert_eq!(
            render_csv(&rows),
            "Filename,Duration,Type\na.wav,2.501,WAV\nb.ogg,10.0,OGG\n"
        );
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("plain.wav"), "plain.wav");
        assert_eq!(csv_field("a,b.wav"), "\"a,b.wav\"");
        assert_eq!(csv_field("say \"hi\".wav"), "\"say \"\"hi\"\".wav\"");
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"").unwrap();
        let dest = dir.path().join(DEFAULT_MANIFEST_NAME);
        let probe = FixedProbe::new(&[("a.wav", 0.5)]);

        let rows = export_manifest(dir.path(), &dest, &probe).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "Filename,Duration,Type\na.wav,0.5,WAV\n"
        );
        // No temporary files left behind
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_unwritable_destination_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing_dir").join(DEFAULT_MANIFEST_NAME);

        let result = write_manifest(&[], &dest);
        assert!(matches!(result, Err(BzError::Manifest(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_failed_persist_keeps_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way of the destination makes the final rename fail
        let dest = dir.path().join("audio_manifest.csv");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), b"x").unwrap();

        let rows = vec![ManifestRow { filename: "a.wav".into(), duration: 1.0, file_type: "WAV" }];
        assert!(write_manifest(&rows, &dest).is_err());
        assert!(dest.join("keep").exists());

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_scan_rejects_missing_directory() {
        assert!(scan_outputs(Path::new("/nonexistent/out"), &FixedProbe::new(&[])).is_err());
    }
}
