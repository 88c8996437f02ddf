//! ffmpeg argument construction
//!
//! `build_command` is pure: it only looks at its arguments and never touches
//! the file system.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use super::filters::{beep_concat_graph, FilterChain};
use crate::core::{BeepAssets, Mode, ProcessingParameters};
use crate::error::{BzError, Result};

/// Argument list for one ffmpeg invocation (binary path excluded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    args: Vec<OsString>,
}

impl EngineCommand {
    fn new() -> Self {
        Self { args: Vec::new() }
    }

    fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self.arg(a);
        }
        self
    }

    pub fn as_args(&self) -> &[OsString] {
        &self.args
    }

    /// Lossy string form, for logs and assertions
    pub fn to_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following `flag`, if present
    pub fn value_of(&self, flag: &str) -> Option<String> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args
            .get(pos + 1)
            .map(|a| a.to_string_lossy().into_owned())
    }

    /// All `-i` inputs in order
    pub fn inputs(&self) -> Vec<String> {
        self.args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].to_string_lossy().into_owned())
            .collect()
    }
}

/// Metadata stripping: drop container tags and any cover-art stream
fn strip_metadata_args(params: &ProcessingParameters) -> &'static [&'static str] {
    if params.strip_metadata {
        &["-map_metadata", "-1", "-vn"]
    } else {
        &[]
    }
}

/// Build the ffmpeg arguments converting `input` into `output`.
///
/// Voice mode applies the radio chain and, when `beep` resolves to a file,
/// concatenates beep + voice + beep. Music mode never filters.
/// A custom beep without a path falls back to no beep.
pub fn build_command(
    input: &Path,
    output: &Path,
    mode: Mode,
    params: &ProcessingParameters,
    assets: &BeepAssets,
) -> Result<EngineCommand> {
    if input.as_os_str().is_empty() {
        return Err(BzError::config("Input path is empty"));
    }

    let mut cmd = EngineCommand::new();
    cmd.args(["-hide_banner", "-y"]);

    if mode.applies_filters() {
        let beep = params.beep.resolve(assets);
        match beep.path() {
            Some(beep) => {
                cmd.arg("-i").arg(beep);
                cmd.arg("-i").arg(input);
                cmd.arg("-i").arg(beep);
                cmd.arg("-filter_complex").arg(beep_concat_graph(params));
                cmd.args(["-map", "[out]"]);
            }
            None => {
                cmd.arg("-i").arg(input);
                cmd.arg("-af").arg(FilterChain::voice(params).to_ffmpeg());
            }
        }
    } else {
        cmd.arg("-i").arg(input);
        cmd.args(["-map", "0:a"]);
    }

    cmd.args(strip_metadata_args(params));
    if mode == Mode::Music {
        cmd.arg("-q:a").arg(params.music_quality.to_string());
    }

    cmd.args(["-c:a", mode.codec()]);
    cmd.arg("-ar").arg(mode.sample_rate().to_string());
    cmd.arg("-ac").arg(mode.channels().to_string());
    cmd.arg(output);

    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BeepChoice, Intensity};
    use std::path::PathBuf;

    fn assets() -> BeepAssets {
        BeepAssets {
            comm: PathBuf::from("/res/commbeep.wav"),
            unit: PathBuf::from("/res/unitbeep.wav"),
        }
    }

    fn no_beep(intensity: Intensity) -> ProcessingParameters {
        ProcessingParameters {
            intensity,
            beep: BeepChoice::None,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_is_config_error() {
        let result = build_command(
            Path::new(""),
            Path::new("/out/a.wav"),
            Mode::Voice,
            &ProcessingParameters::default(),
            &assets(),
        );
        assert!(matches!(result, Err(BzError::Config(_))));
    }

    #[test]
    fn test_voice_without_beep_uses_af() {
        let cmd = build_command(
            Path::new("/in/line.mp3"),
            Path::new("/out/line.wav"),
            Mode::Voice,
            &no_beep(Intensity::Light),
            &assets(),
        )
        .unwrap();

        assert_eq!(cmd.inputs(), vec!["/in/line.mp3"]);
        assert_eq!(cmd.value_of("-filter_complex"), None);
        assert!(cmd.value_of("-af").unwrap().starts_with("aresample=22050,highpass=f=300,lowpass=f=4000"));
        assert_eq!(cmd.value_of("-c:a").as_deref(), Some("pcm_u8"));
        assert_eq!(cmd.value_of("-ar").as_deref(), Some("22050"));
        assert_eq!(cmd.value_of("-ac").as_deref(), Some("1"));
        assert_eq!(cmd.to_strings().last().map(String::as_str), Some("/out/line.wav"));
    }

    #[test]
    fn test_voice_with_beep_concatenates_three_segments() {
        let params = ProcessingParameters {
            beep: BeepChoice::Unit,
            ..Default::default()
        };
        let cmd = build_command(
            Path::new("/in/line.wav"),
            Path::new("/out/line.wav"),
            Mode::Voice,
            &params,
            &assets(),
        )
        .unwrap();

        assert_eq!(
            cmd.inputs(),
            vec!["/res/unitbeep.wav", "/in/line.wav", "/res/unitbeep.wav"]
        );
        let graph = cmd.value_of("-filter_complex").unwrap();
        assert!(graph.contains("[b1][m][b2]concat=n=3:v=0:a=1[out]"));
        assert_eq!(graph.matches("aformat=sample_fmts=s16:sample_rates=22050:channel_layouts=mono").count(), 3);
        assert_eq!(cmd.value_of("-map").as_deref(), Some("[out]"));
        assert_eq!(cmd.value_of("-af"), None);
    }

    #[test]
    fn test_every_beep_choice_builds_concat() {
        for beep in [
            BeepChoice::Comm,
            BeepChoice::Unit,
            BeepChoice::Custom(Some(PathBuf::from("/me/beep.wav"))),
        ] {
            let params = ProcessingParameters {
                beep,
                ..Default::default()
            };
            let cmd = build_command(
                Path::new("/in/x.wav"),
                Path::new("/out/x.wav"),
                Mode::Voice,
                &params,
                &assets(),
            )
            .unwrap();
            let inputs = cmd.inputs();
            assert_eq!(inputs.len(), 3);
            assert_eq!(inputs[0], inputs[2]);
            assert_eq!(inputs[1], "/in/x.wav");
        }
    }

    #[test]
    fn test_custom_beep_without_path_falls_back_to_no_beep() {
        let params = ProcessingParameters {
            beep: BeepChoice::Custom(None),
            ..Default::default()
        };
        let cmd = build_command(
            Path::new("/in/x.wav"),
            Path::new("/out/x.wav"),
            Mode::Voice,
            &params,
            &assets(),
        )
        .unwrap();
        assert_eq!(cmd.inputs(), vec!["/in/x.wav"]);
        assert!(cmd.value_of("-af").is_some());
    }

    #[test]
    fn test_strip_metadata_flags() {
        let mut params = no_beep(Intensity::None);
        let cmd = build_command(
            Path::new("/in/x.wav"),
            Path::new("/out/x.wav"),
            Mode::Voice,
            &params,
            &assets(),
        )
        .unwrap();
        assert_eq!(cmd.value_of("-map_metadata").as_deref(), Some("-1"));
        assert!(cmd.to_strings().contains(&"-vn".to_string()));

        params.strip_metadata = false;
        let cmd = build_command(
            Path::new("/in/x.wav"),
            Path::new("/out/x.wav"),
            Mode::Voice,
            &params,
            &assets(),
        )
        .unwrap();
        assert_eq!(cmd.value_of("-map_metadata"), None);
        assert!(!cmd.to_strings().contains(&"-vn".to_string()));
    }

    #[test]
    fn test_music_mode_never_filters() {
        let params = ProcessingParameters {
            intensity: Intensity::Heavy,
            phaser_enabled: true,
            echo_enabled: true,
            echo_delay_ms: 30,
            beep: BeepChoice::Comm,
            music_quality: 7,
            ..Default::default()
        };
        let cmd = build_command(
            Path::new("/in/theme.flac"),
            Path::new("/out/theme.ogg"),
            Mode::Music,
            &params,
            &assets(),
        )
        .unwrap();

        assert_eq!(cmd.inputs(), vec!["/in/theme.flac"]);
        assert_eq!(cmd.value_of("-af"), None);
        assert_eq!(cmd.value_of("-filter_complex"), None);
        assert_eq!(cmd.value_of("-map").as_deref(), Some("0:a"));
        assert_eq!(cmd.value_of("-c:a").as_deref(), Some("libvorbis"));
        assert_eq!(cmd.value_of("-q:a").as_deref(), Some("7"));
        assert_eq!(cmd.value_of("-ar").as_deref(), Some("44100"));
        assert_eq!(cmd.value_of("-ac").as_deref(), Some("2"));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let params = ProcessingParameters::default();
        let a = build_command(Path::new("/in/a.wav"), Path::new("/o/a.wav"), Mode::Voice, &params, &assets()).unwrap();
        let b = build_command(Path::new("/in/a.wav"), Path::new("/o/a.wav"), Mode::Voice, &params, &assets()).unwrap();
        assert_eq!(a, b);
        // Reruns overwrite earlier exports
        assert!(a.to_strings().contains(&"-y".to_string()));
    }
}
