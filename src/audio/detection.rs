use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BzError, Result};

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Check if a file can be fed into a batch, based on its extension
pub fn is_input_audio_file(path: &Path) -> bool {
    matches!(
        lowercase_extension(path).as_deref(),
        Some("wav" | "mp3" | "m4a" | "ogg")
    )
}

/// Manifest type label for a converted file, `None` if it is not listed
pub fn manifest_type(path: &Path) -> Option<&'static str> {
    match lowercase_extension(path).as_deref() {
        Some("wav") => Some("WAV"),
        Some("ogg") => Some("OGG"),
        _ => None,
    }
}

/// Expand a user selection into batch inputs.
///
/// A file is taken as-is. A directory is listed without recursion and
/// filtered to supported audio extensions, in directory listing order.
pub fn discover_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(BzError::config(format!("Input not found: {}", path.display())));
    }

    let files = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_input_audio_file(p))
        .collect();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_input_formats() {
        assert!(is_input_audio_file(Path::new("line.wav")));
        assert!(is_input_audio_file(Path::new("line.MP3")));
        assert!(is_input_audio_file(Path::new("line.m4a")));
        assert!(is_input_audio_file(Path::new("theme.Ogg")));
    }

    #[test]
    fn test_rejects_non_input() {
        assert!(!is_input_audio_file(Path::new("notes.txt")));
        assert!(!is_input_audio_file(Path::new("theme.flac")));
        assert!(!is_input_audio_file(Path::new("noext")));
    }

    #[test]
    fn test_manifest_type_is_case_insensitive() {
        assert_eq!(manifest_type(Path::new("a.wav")), Some("WAV"));
        assert_eq!(manifest_type(Path::new("a.WAV")), Some("WAV"));
        assert_eq!(manifest_type(Path::new("b.ogg")), Some("OGG"));
        assert_eq!(manifest_type(Path::new("b.OGG")), Some("OGG"));
        assert_eq!(manifest_type(Path::new("c.mp3")), None);
        assert_eq!(manifest_type(Path::new("c.txt")), None);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("line.mp3");
        std::fs::write(&file, b"").unwrap();
        assert_eq!(discover_inputs(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_discover_folder_filters_and_skips_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.wav", "b.MP3", "c.txt", "d.m4a"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("e.wav"), b"").unwrap();

        let mut names: Vec<String> = discover_inputs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.wav", "b.MP3", "d.m4a"]);
    }

    #[test]
    fn test_discover_missing_path_is_error() {
        assert!(discover_inputs(Path::new("/nonexistent/voice")).is_err());
    }
}
