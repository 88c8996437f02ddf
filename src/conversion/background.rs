//! Background batch worker
//!
//! A batch runs on its own thread so the caller (a UI or the CLI) stays
//! responsive. Progress flows back over a channel as `BatchEvent`s; the
//! worker never touches caller state directly.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use super::batch::{BatchJob, BatchProgress, BatchReport, BatchRunner};
use super::ffmpeg::JobResult;
use crate::error::{BzError, Result};

/// Events emitted by the batch worker, in order
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Output directory is ready and the first file is about to start
    Started { total: usize },
    /// A file finished (success or failure)
    Progress {
        progress: BatchProgress,
        result: JobResult,
    },
    /// Every file has been attempted
    Finished(BatchReport),
    /// The batch could not start (output directory creation failed)
    Aborted(String),
}

/// Handle to a running batch
pub struct BatchWorker {
    events: mpsc::Receiver<BatchEvent>,
    handle: JoinHandle<Result<BatchReport>>,
}

impl BatchWorker {
    /// Start `job` on a dedicated thread.
    ///
    /// The job is moved into the worker, so its parameters cannot change
    /// while it runs.
    pub fn spawn(runner: BatchRunner, job: BatchJob) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("bzradio-batch".to_string())
            .spawn(move || run_worker(runner, job, tx))
            .map_err(BzError::Io)?;

        Ok(Self { events: rx, handle })
    }

    /// Receiver for progress events. Closed once the worker exits.
    pub fn events(&self) -> &mpsc::Receiver<BatchEvent> {
        &self.events
    }

    /// Wait for the worker and return its final result
    pub fn join(self) -> Result<BatchReport> {
        self.handle
            .join()
            .map_err(|_| BzError::Worker("thread panicked".to_string()))?
    }
}

fn run_worker(
    runner: BatchRunner,
    job: BatchJob,
    tx: mpsc::Sender<BatchEvent>,
) -> Result<BatchReport> {
    // The receiver may already be gone; sends are best-effort
    if let Err(e) = runner.prepare(&job) {
        log::error!("Batch aborted: {}", e);
        let _ = tx.send(BatchEvent::Aborted(e.to_string()));
        return Err(e);
    }

    let _ = tx.send(BatchEvent::Started { total: job.len() });

    let report = runner.run_prepared(&job, |progress, result| {
        let _ = tx.send(BatchEvent::Progress {
            progress: progress.clone(),
            result: result.clone(),
        });
    });

    let _ = tx.send(BatchEvent::Finished(report.clone()));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Mode, ProcessingParameters};
    use crate::test_fixtures::{test_assets, ScriptedEngine};
    use std::sync::Arc;

    #[test]
    fn test_worker_event_order() {
        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(
            vec![dir.path().join("a.wav"), dir.path().join("b.wav")],
            Mode::Voice,
            ProcessingParameters::default(),
        )
        .unwrap();
        let runner = BatchRunner::new(Arc::new(ScriptedEngine::failing_on(&["b.wav"])), test_assets());

        let worker = BatchWorker::spawn(runner, job).unwrap();
        let events: Vec<BatchEvent> = worker.events().iter().collect();
        let report = worker.join().unwrap();

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], BatchEvent::Started { total: 2 }));
        match &events[1] {
            BatchEvent::Progress { progress, result } => {
                assert_eq!(progress.completed, 1);
                assert!(result.success);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[2] {
            BatchEvent::Progress { progress, result } => {
                assert_eq!(progress.completed, 2);
                assert_eq!(progress.current_file, "b.wav");
                assert!(!result.success);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(events[3], BatchEvent::Finished(_)));
        assert_eq!(report.failed_count(), 1);
    }

    struct PanickingEngine;

    impl crate::conversion::MediaEngine for PanickingEngine {
        fn run(&self, _command: &crate::conversion::EngineCommand) -> std::result::Result<(), String> {
            panic!("engine crashed");
        }
    }

    #[test]
    fn test_worker_panic_is_worker_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(
            vec![dir.path().join("a.wav")],
            Mode::Voice,
            ProcessingParameters::default(),
        )
        .unwrap();
        let runner = BatchRunner::new(Arc::new(PanickingEngine), test_assets());

        let worker = BatchWorker::spawn(runner, job).unwrap();
        let events: Vec<BatchEvent> = worker.events().iter().collect();

        assert!(matches!(events.as_slice(), [BatchEvent::Started { total: 1 }]));
        assert!(matches!(worker.join(), Err(BzError::Worker(_))));
    }

    #[test]
    fn test_worker_reports_abort() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let job = BatchJob::with_output_dir(
            vec![dir.path().join("a.wav")],
            Mode::Voice,
            ProcessingParameters::default(),
            blocker.join("out"),
        )
        .unwrap();
        let runner = BatchRunner::new(Arc::new(ScriptedEngine::succeeding()), test_assets());

        let worker = BatchWorker::spawn(runner, job).unwrap();
        let events: Vec<BatchEvent> = worker.events().iter().collect();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], BatchEvent::Aborted(_)));
        assert!(matches!(worker.join(), Err(BzError::OutputDir { .. })));
    }
}
