//! BZRadio command-line shell
//!
//! Collects parameters, starts batches on the background worker and renders
//! its progress events. All conversion logic lives in the library.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};

use bzradio::audio::{discover_inputs, SymphoniaProbe};
use bzradio::conversion::{
    locate_beep_assets, verify_ffmpeg, BatchEvent, BatchJob, BatchOutcome, BatchReport,
    BatchRunner, BatchWorker, FfmpegEngine,
};
use bzradio::core::{BeepChoice, Intensity, Mode, ProcessingParameters, Settings};
use bzradio::manifest::{export_manifest, DEFAULT_MANIFEST_NAME};
use bzradio::{logging, BzError, Result};

/// Exit status when a batch finished with failed files
const EXIT_BATCH_FAILURES: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "bzradio", version, about = "Battlezone 98 Redux audio tool")]
struct Cli {
    /// ffmpeg binary to use instead of the bundled one or PATH
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,

    /// Directory containing commbeep.wav and unitbeep.wav
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    /// Show debug output in the terminal
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Remember the parameters of this run as the new defaults
    #[arg(long, global = true)]
    save_defaults: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert voice lines to radio-filtered 8-bit mono WAV
    Radio(RadioArgs),
    /// Convert music to stereo OGG
    Music(MusicArgs),
    /// Write a CSV of output durations
    Manifest {
        /// Folder of converted WAV/OGG files
        dir: PathBuf,
        /// Manifest path (defaults to audio_manifest.csv inside the folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Audio files or folders (folders are not searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Keep tags and cover art
    #[arg(long)]
    keep_metadata: bool,

    /// Write outputs here instead of the export folder next to the inputs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write the batch report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RadioArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, value_enum)]
    intensity: Option<IntensityArg>,

    #[arg(long, value_enum)]
    beep: Option<BeepArg>,

    /// WAV used with `--beep custom`
    #[arg(long)]
    custom_beep: Option<PathBuf>,

    #[arg(long)]
    phaser: bool,

    /// Enable echo with this delay
    #[arg(long, value_parser = clap::value_parser!(u32).range(10..=100))]
    echo_ms: Option<u32>,
}

#[derive(Args, Debug)]
struct MusicArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Vorbis quality
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
    quality: Option<u8>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum IntensityArg {
    None,
    Light,
    Medium,
    Heavy,
}

impl From<IntensityArg> for Intensity {
    fn from(arg: IntensityArg) -> Self {
        match arg {
            IntensityArg::None => Intensity::None,
            IntensityArg::Light => Intensity::Light,
            IntensityArg::Medium => Intensity::Medium,
            IntensityArg::Heavy => Intensity::Heavy,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BeepArg {
    Comm,
    Unit,
    Custom,
    None,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut settings = Settings::load();
    if let Some(path) = &cli.ffmpeg {
        settings.ffmpeg_path = Some(path.clone());
    }
    if let Some(dir) = &cli.assets_dir {
        settings.assets_dir = Some(dir.clone());
    }

    match cli.command {
        Commands::Radio(args) => {
            let params = radio_params(&settings.parameters, &args);
            if cli.save_defaults {
                save_defaults(&mut settings, &params);
            }
            run_batch(&settings, Mode::Voice, params, &args.common)
        }
        Commands::Music(args) => {
            let mut params = settings.parameters.clone();
            params.strip_metadata = !args.common.keep_metadata;
            if let Some(q) = args.quality {
                params.music_quality = q;
            }
            if cli.save_defaults {
                save_defaults(&mut settings, &params);
            }
            run_batch(&settings, Mode::Music, params, &args.common)
        }
        Commands::Manifest { dir, output } => {
            let dest = output.unwrap_or_else(|| dir.join(DEFAULT_MANIFEST_NAME));
            export_manifest(&dir, &dest, &SymphoniaProbe)?;
            Ok(0)
        }
    }
}

/// Parameter snapshot for a radio batch: saved defaults overridden by flags
fn radio_params(defaults: &ProcessingParameters, args: &RadioArgs) -> ProcessingParameters {
    let mut params = defaults.clone();
    params.strip_metadata = !args.common.keep_metadata;

    if let Some(intensity) = args.intensity {
        params.intensity = intensity.into();
    }
    if let Some(beep) = args.beep {
        params.beep = match beep {
            BeepArg::Comm => BeepChoice::Comm,
            BeepArg::Unit => BeepChoice::Unit,
            BeepArg::Custom => BeepChoice::Custom(args.custom_beep.clone()),
            BeepArg::None => BeepChoice::None,
        };
    } else if args.custom_beep.is_some() {
        params.beep = BeepChoice::Custom(args.custom_beep.clone());
    }
    if args.phaser {
        params.phaser_enabled = true;
    }
    if let Some(ms) = args.echo_ms {
        params.echo_enabled = true;
        params.echo_delay_ms = ms;
    }

    params
}

fn save_defaults(settings: &mut Settings, params: &ProcessingParameters) {
    settings.parameters = params.clone();
    if let Err(e) = settings.save() {
        log::warn!("Could not save defaults: {}", e);
    }
}

fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        inputs.extend(discover_inputs(path)?);
    }
    if inputs.is_empty() {
        return Err(BzError::config("No supported audio files found"));
    }
    Ok(inputs)
}

fn run_batch(
    settings: &Settings,
    mode: Mode,
    params: ProcessingParameters,
    common: &CommonArgs,
) -> Result<i32> {
    let inputs = collect_inputs(&common.inputs)?;
    let job = match &common.output_dir {
        Some(dir) => BatchJob::with_output_dir(inputs, mode, params, dir.clone())?,
        None => BatchJob::new(inputs, mode, params)?,
    };

    let ffmpeg = verify_ffmpeg(settings.ffmpeg_path.as_deref())?;
    let assets = locate_beep_assets(settings.assets_dir.as_deref());
    let runner = BatchRunner::new(Arc::new(FfmpegEngine::new(ffmpeg)), assets);

    let worker = BatchWorker::spawn(runner, job)?;
    for event in worker.events().iter() {
        match event {
            BatchEvent::Started { total } => println!("Converting {} files...", total),
            BatchEvent::Progress { progress, result } => {
                let status = if result.success { "ok" } else { "FAILED" };
                println!(
                    "[{}/{}] {} {}",
                    progress.completed, progress.total, progress.current_file, status
                );
            }
            BatchEvent::Finished(_) | BatchEvent::Aborted(_) => {}
        }
    }
    let report = worker.join()?;

    if let Some(path) = &common.report {
        write_report(&report, path)?;
    }
    print_summary(&report);

    Ok(match report.outcome() {
        BatchOutcome::Success => 0,
        BatchOutcome::PartialFailure | BatchOutcome::Failed => EXIT_BATCH_FAILURES,
    })
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| BzError::config(format!("Failed to serialize report: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!(
        "Done: {} of {} files exported to {}",
        report.succeeded_count(),
        report.total(),
        report.output_dir.display()
    );
    if report.failed_count() > 0 {
        println!("{} files failed:", report.failed_count());
        for failure in report.failures() {
            println!(
                "  {}: {}",
                failure.input_name(),
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
