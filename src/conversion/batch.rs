//! Sequential batch conversion
//!
//! A `BatchJob` owns its inputs and a parameter snapshot. The runner creates
//! the output directory once, then converts files one at a time, reporting
//! progress after each file whether it succeeded or not. A failed file never
//! stops the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::command::build_command;
use super::ffmpeg::{file_display_name, JobResult, MediaEngine};
use crate::core::{BeepAssets, BeepSource, Mode, ProcessingParameters};
use crate::error::{BzError, Result};

/// Everything needed to convert one set of files
#[derive(Debug, Clone)]
pub struct BatchJob {
    inputs: Vec<PathBuf>,
    mode: Mode,
    params: ProcessingParameters,
    output_dir: PathBuf,
}

impl BatchJob {
    /// Create a job writing next to the first input, in the mode's export folder
    pub fn new(inputs: Vec<PathBuf>, mode: Mode, params: ProcessingParameters) -> Result<Self> {
        let first = inputs
            .first()
            .ok_or_else(|| BzError::config("No input files selected"))?;
        let output_dir = default_output_dir(first, mode);
        Self::with_output_dir(inputs, mode, params, output_dir)
    }

    /// Create a job writing into an explicit directory
    pub fn with_output_dir(
        inputs: Vec<PathBuf>,
        mode: Mode,
        params: ProcessingParameters,
        output_dir: PathBuf,
    ) -> Result<Self> {
        if inputs.is_empty() {
            return Err(BzError::config("No input files selected"));
        }
        params.validate()?;
        Ok(Self {
            inputs,
            mode,
            params,
            output_dir,
        })
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn params(&self) -> &ProcessingParameters {
        &self.params
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// `<parent of first input>/<mode export folder>`
pub fn default_output_dir(first_input: &Path, mode: Mode) -> PathBuf {
    first_input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(mode.export_folder())
}

/// Output file for an input: same stem, mode extension.
///
/// Two inputs with the same stem map to the same output; the later one wins.
pub fn output_path_for(output_dir: &Path, input: &Path, mode: Mode) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    output_dir.join(format!("{}.{}", stem, mode.extension()))
}

/// Progress after a file finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub current_file: String,
}

/// How a finished batch went overall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Success,
    /// Some files converted, some failed
    PartialFailure,
    Failed,
}

/// All per-file results of a batch, in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub mode: Mode,
    pub output_dir: PathBuf,
    pub results: Vec<JobResult>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.succeeded_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn outcome(&self) -> BatchOutcome {
        match (self.succeeded_count(), self.failed_count()) {
            (_, 0) => BatchOutcome::Success,
            (0, _) => BatchOutcome::Failed,
            _ => BatchOutcome::PartialFailure,
        }
    }
}

/// Converts batches one file at a time through a `MediaEngine`
#[derive(Clone)]
pub struct BatchRunner {
    engine: Arc<dyn MediaEngine>,
    assets: BeepAssets,
}

impl BatchRunner {
    pub fn new(engine: Arc<dyn MediaEngine>, assets: BeepAssets) -> Self {
        Self { engine, assets }
    }

    /// Create the job's output directory.
    ///
    /// This is the only step that can fail a whole batch, and it runs before
    /// any file is touched.
    pub fn prepare(&self, job: &BatchJob) -> Result<()> {
        std::fs::create_dir_all(job.output_dir()).map_err(|source| BzError::OutputDir {
            path: job.output_dir().to_path_buf(),
            source,
        })
    }

    /// Prepare the output directory, then convert every file in `job`,
    /// calling `on_progress` after each one.
    pub fn run<F>(&self, job: &BatchJob, on_progress: F) -> Result<BatchReport>
    where
        F: FnMut(&BatchProgress, &JobResult),
    {
        self.prepare(job)?;
        Ok(self.run_prepared(job, on_progress))
    }

    /// Convert every file in `job` into an already prepared output directory
    pub fn run_prepared<F>(&self, job: &BatchJob, mut on_progress: F) -> BatchReport
    where
        F: FnMut(&BatchProgress, &JobResult),
    {
        let started_at = Local::now();
        let total = job.len();

        log::info!(
            "Starting {:?} batch: {} files -> {}",
            job.mode(),
            total,
            job.output_dir().display()
        );
        if job.mode() == Mode::Voice && job.params().beep.resolve(&self.assets) == BeepSource::Fallback {
            log::warn!("No custom beep file chosen, batch will run without beep");
        }

        let mut results = Vec::with_capacity(total);

        for (index, input) in job.inputs().iter().enumerate() {
            let output = output_path_for(job.output_dir(), input, job.mode());
            let result = self.convert_one(job, input, &output);

            if result.success {
                log::debug!(
                    "Exported ({}/{}): {}",
                    index + 1,
                    total,
                    file_display_name(&output)
                );
            } else {
                log::debug!(
                    "Failed ({}/{}): {} - {}",
                    index + 1,
                    total,
                    result.input_name(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }

            let progress = BatchProgress {
                completed: index + 1,
                total,
                current_file: result.input_name(),
            };
            on_progress(&progress, &result);
            results.push(result);
        }

        let report = BatchReport {
            mode: job.mode(),
            output_dir: job.output_dir().to_path_buf(),
            results,
            started_at,
            finished_at: Local::now(),
        };

        log::info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded_count(),
            report.failed_count()
        );

        report
    }

    fn convert_one(&self, job: &BatchJob, input: &Path, output: &Path) -> JobResult {
        let command = match build_command(input, output, job.mode(), job.params(), &self.assets) {
            Ok(c) => c,
            Err(e) => return JobResult::failed(input, output, e.to_string()),
        };

        match self.engine.run(&command) {
            Ok(()) => JobResult::succeeded(input, output),
            Err(detail) => JobResult::failed(input, output, detail),
        }
    }
}
