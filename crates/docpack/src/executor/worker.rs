use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, error, info, warn};

use crate::converter::DocumentConverter;
use crate::error::{ErrorKind, ExecutorError};
use crate::pipeline::{ExportContext, ExportPipeline, ExportRequest, ExportResult, PipelineConfig};

use super::event::{ChannelProgress, ExecutorState, ExportEvent};

struct ExportJob {
    id: String,
    request: ExportRequest,
}

/// Runs exports on one dedicated worker thread.
///
/// `submit` never blocks. Progress and the final result arrive as
/// [`ExportEvent`]s on a single channel. Only one export runs at a time; a
/// submission while one is in flight is rejected with `ExecutorError::Busy`.
///
/// State transitions: `submit` moves `Idle | Completed | Failed` to
/// `Running`; only the worker moves `Running` to `Completed | Failed`.
/// The state therefore has two writers. `submit` sets `Running` under the
/// same lock that checked `accepts_work`, so a second caller sees `Running`
/// before the worker has even picked the job up; the worker never writes
/// `Running` itself.
pub struct BackgroundExecutor {
    job_sender: Option<Sender<ExportJob>>,
    event_receiver: Receiver<ExportEvent>,
    worker: Option<JoinHandle<()>>,
    state: Arc<Mutex<ExecutorState>>,
}

impl BackgroundExecutor {
    pub fn new(
        config: Arc<PipelineConfig>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self, ExecutorError> {
        let (job_sender, job_receiver) = bounded::<ExportJob>(1);
        let (event_sender, event_receiver) = unbounded::<ExportEvent>();
        let state = Arc::new(Mutex::new(ExecutorState::Idle));

        let worker_state = Arc::clone(&state);
        let worker = thread::Builder::new()
            .name("docpack-export".to_string())
            .spawn(move || {
                run_worker(job_receiver, event_sender, worker_state, config, converter);
            })
            .map_err(|e| ExecutorError::SpawnFailed(e.to_string()))?;

        info!("Started export worker");

        Ok(Self {
            job_sender: Some(job_sender),
            event_receiver,
            worker: Some(worker),
            state,
        })
    }

    /// Hands a batch to the worker and returns its job id.
    pub fn submit(&self, request: ExportRequest) -> Result<String, ExecutorError> {
        let sender = self.job_sender.as_ref().ok_or(ExecutorError::ChannelClosed)?;

        let mut state = lock_state(&self.state);
        if !state.accepts_work() {
            debug!("Rejecting export submission, worker busy");
            return Err(ExecutorError::Busy);
        }

        let job = ExportJob {
            id: uuid::Uuid::new_v4().to_string(),
            request,
        };
        let job_id = job.id.clone();

        match sender.try_send(job) {
            Ok(()) => {
                *state = ExecutorState::Running;
                info!("Export {} submitted", job_id);
                Ok(job_id)
            }
            Err(TrySendError::Full(_)) => Err(ExecutorError::Busy),
            Err(TrySendError::Disconnected(_)) => Err(ExecutorError::ChannelClosed),
        }
    }

    pub fn state(&self) -> ExecutorState {
        *lock_state(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == ExecutorState::Running
    }

    pub fn try_recv_event(&self) -> Option<ExportEvent> {
        self.event_receiver.try_recv().ok()
    }

    pub fn recv_event(&self) -> Option<ExportEvent> {
        self.event_receiver.recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ExportEvent> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Receiver handle for use in `select!` loops.
    pub fn events(&self) -> Receiver<ExportEvent> {
        self.event_receiver.clone()
    }

    /// Stops accepting work and waits for the in-flight export, if any.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Drop sender to signal the worker to exit
        drop(self.job_sender.take());

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                error!("Export worker panicked: {:?}", e);
            } else {
                debug!("Export worker finished");
            }
        }
    }
}

impl Drop for BackgroundExecutor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_state(state: &Mutex<ExecutorState>) -> MutexGuard<'_, ExecutorState> {
    // The state is a plain Copy value; a poisoned lock still holds a valid one.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn run_worker(
    job_receiver: Receiver<ExportJob>,
    event_sender: Sender<ExportEvent>,
    state: Arc<Mutex<ExecutorState>>,
    config: Arc<PipelineConfig>,
    converter: Arc<dyn DocumentConverter>,
) {
    debug!("Export worker started");

    loop {
        let job = match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Export worker job channel disconnected");
                break;
            }
        };

        let items_total = job.request.items.len();
        info!("Export {} started with {} item(s)", job.id, items_total);
        let _ = event_sender.send(ExportEvent::Started {
            job_id: job.id.clone(),
            items_total,
        });

        let progress = ChannelProgress::new(&job.id, event_sender.clone());
        let pipeline = ExportPipeline::new(Arc::clone(&config), Arc::clone(&converter));
        let mut ctx = ExportContext::new(job.request);

        let run = AssertUnwindSafe(|| pipeline.run_in(&mut ctx, &progress));
        let result = panic::catch_unwind(run).unwrap_or_else(|payload| {
            let reason = panic_message(payload.as_ref());
            error!("Export {} panicked: {}", job.id, reason);
            // Keep what the run recorded before it went down.
            ExportResult::failure(
                ctx.items_total(),
                ctx.converted.len(),
                ctx.failures.clone(),
                ErrorKind::Configuration,
                format!("internal error: {}", reason),
            )
        });

        let final_state = if result.success {
            ExecutorState::Completed
        } else {
            ExecutorState::Failed
        };

        // Publish the state before the event so a caller reacting to
        // `Finished` can submit again immediately.
        *lock_state(&state) = final_state;

        if result.success {
            info!("Export {} finished: {}", job.id, result.summary());
        } else {
            warn!("Export {} failed: {}", job.id, result.summary());
        }

        if let Err(e) = event_sender.send(ExportEvent::Finished {
            job_id: job.id,
            state: final_state,
            result,
        }) {
            debug!("No listener for export result: {}", e);
        }
    }

    debug!("Export worker stopped");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::import::ImportList;
    use crate::pipeline::ExportOutcome;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Converter that blocks until released, for holding an export in flight.
    struct GatedConverter {
        release: Mutex<Receiver<()>>,
    }

    impl DocumentConverter for GatedConverter {
        fn convert(
            &self,
            _source: &Path,
            workdir: &Path,
            surrogate: &str,
        ) -> Result<PathBuf, ConvertError> {
            if let Ok(release) = self.release.lock() {
                let _ = release.recv_timeout(Duration::from_secs(10));
            }
            let path = workdir.join(format!("{}.pdf", surrogate));
            std::fs::write(&path, b"%PDF-1.4").map_err(|e| ConvertError::Staging {
                path: path.clone(),
                source: e,
            })?;
            Ok(path)
        }

        fn check_available(&self) -> Result<(), ConvertError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    /// Panics on `boom.*`, fails `bad.*`, converts anything else.
    struct PanickingConverter;

    impl DocumentConverter for PanickingConverter {
        fn convert(
            &self,
            source: &Path,
            workdir: &Path,
            surrogate: &str,
        ) -> Result<PathBuf, ConvertError> {
            match source.file_stem().and_then(|s| s.to_str()) {
                Some("boom") => panic!("converter exploded"),
                Some("bad") => Err(ConvertError::Failed {
                    status: "exit code 1".to_string(),
                    stderr: "corrupt document".to_string(),
                }),
                _ => {
                    let path = workdir.join(format!("{}.pdf", surrogate));
                    std::fs::write(&path, b"%PDF-1.4").map_err(|e| ConvertError::Staging {
                        path: path.clone(),
                        source: e,
                    })?;
                    Ok(path)
                }
            }
        }

        fn check_available(&self) -> Result<(), ConvertError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        output: PathBuf,
        config: Arc<PipelineConfig>,
        list: ImportList,
    }

    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let temp_dir = TempDir::new().unwrap();
            let input = temp_dir.path().join("input");
            let output = temp_dir.path().join("output");
            let work = temp_dir.path().join("work");
            for dir in [&input, &output, &work] {
                std::fs::create_dir_all(dir).unwrap();
            }

            let mut list = ImportList::new();
            for file in files {
                let path = input.join(file);
                std::fs::write(&path, b"content").unwrap();
                list.add(&path).unwrap();
            }

            let config = Arc::new(PipelineConfig {
                workspace_root: Some(work),
                ..PipelineConfig::default()
            });

            Self {
                _temp_dir: temp_dir,
                output,
                config,
                list,
            }
        }

        fn request(&self) -> ExportRequest {
            ExportRequest::new(self.list.snapshot(), &self.output)
        }
    }

    fn wait_finished(executor: &BackgroundExecutor) -> (String, ExecutorState, ExportResult) {
        loop {
            match executor.recv_event_timeout(Duration::from_secs(20)) {
                Some(ExportEvent::Finished {
                    job_id,
                    state,
                    result,
                }) => return (job_id, state, result),
                Some(_) => continue,
                None => panic!("Timed out waiting for export to finish"),
            }
        }
    }

    #[test]
    fn test_executor_starts_idle() {
        let fx = Fixture::new(&[]);
        let (_tx, rx) = bounded(0);
        let executor = BackgroundExecutor::new(
            Arc::clone(&fx.config),
            Arc::new(GatedConverter {
                release: Mutex::new(rx),
            }),
        )
        .unwrap();

        assert_eq!(executor.state(), ExecutorState::Idle);
        assert!(!executor.is_running());
        executor.shutdown();
    }

    #[test]
    fn test_second_submission_rejected_while_running() {
        let fx = Fixture::new(&["a.docx", "b.odt"]);
        let (release_tx, release_rx) = unbounded();
        let executor = BackgroundExecutor::new(
            Arc::clone(&fx.config),
            Arc::new(GatedConverter {
                release: Mutex::new(release_rx),
            }),
        )
        .unwrap();

        let first = executor.submit(fx.request()).unwrap();
        assert_eq!(executor.state(), ExecutorState::Running);

        let second = executor.submit(fx.request());
        assert!(matches!(second, Err(ExecutorError::Busy)));

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();

        let (job_id, state, result) = wait_finished(&executor);
        assert_eq!(job_id, first);
        assert_eq!(state, ExecutorState::Completed);
        assert_eq!(result.outcome(), ExportOutcome::Succeeded);
        assert_eq!(result.members, vec!["a.pdf", "b.pdf"]);
        assert_eq!(executor.state(), ExecutorState::Completed);

        // No second result was produced for the rejected submission.
        assert!(executor
            .recv_event_timeout(Duration::from_millis(200))
            .is_none());
        executor.shutdown();
    }

    #[test]
    fn test_events_in_order_and_result_once() {
        let fx = Fixture::new(&["a.docx"]);
        let (release_tx, release_rx) = unbounded();
        release_tx.send(()).unwrap();
        let executor = BackgroundExecutor::new(
            Arc::clone(&fx.config),
            Arc::new(GatedConverter {
                release: Mutex::new(release_rx),
            }),
        )
        .unwrap();

        executor.submit(fx.request()).unwrap();

        let mut events = Vec::new();
        loop {
            let event = executor
                .recv_event_timeout(Duration::from_secs(20))
                .expect("event");
            let done = matches!(event, ExportEvent::Finished { .. });
            events.push(event);
            if done {
                break;
            }
        }

        assert!(matches!(
            events.first(),
            Some(ExportEvent::Started { items_total: 1, .. })
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, ExportEvent::Progress { .. })));
        let finished = events
            .iter()
            .filter(|e| matches!(e, ExportEvent::Finished { .. }))
            .count();
        assert_eq!(finished, 1);
        executor.shutdown();
    }

    #[test]
    fn test_resubmit_after_completion() {
        let fx = Fixture::new(&["a.docx"]);
        let (release_tx, release_rx) = unbounded();
        let executor = BackgroundExecutor::new(
            Arc::clone(&fx.config),
            Arc::new(GatedConverter {
                release: Mutex::new(release_rx),
            }),
        )
        .unwrap();

        release_tx.send(()).unwrap();
        executor.submit(fx.request()).unwrap();
        let (_, state, _) = wait_finished(&executor);
        assert_eq!(state, ExecutorState::Completed);

        release_tx.send(()).unwrap();
        executor.submit(fx.request()).unwrap();
        let (_, state, result) = wait_finished(&executor);
        assert_eq!(state, ExecutorState::Completed);
        assert!(result.success);
        executor.shutdown();
    }

    #[test]
    fn test_failed_run_reports_failed_state() {
        let fx = Fixture::new(&["a.docx"]);
        let (_tx, rx) = unbounded();
        let executor = BackgroundExecutor::new(
            Arc::clone(&fx.config),
            Arc::new(GatedConverter {
                release: Mutex::new(rx),
            }),
        )
        .unwrap();

        let request = ExportRequest::new(fx.list.snapshot(), fx.output.join("missing"));
        executor.submit(request).unwrap();

        let (_, state, result) = wait_finished(&executor);
        assert_eq!(state, ExecutorState::Failed);
        assert_eq!(result.error_kind(), Some(ErrorKind::Filesystem));
        assert_eq!(executor.state(), ExecutorState::Failed);
        executor.shutdown();
    }

    #[test]
    fn test_panic_in_pipeline_becomes_failed_result() {
        let fx = Fixture::new(&["boom.docx"]);
        let executor =
            BackgroundExecutor::new(Arc::clone(&fx.config), Arc::new(PanickingConverter)).unwrap();

        executor.submit(fx.request()).unwrap();
        let (_, state, result) = wait_finished(&executor);

        assert_eq!(state, ExecutorState::Failed);
        let reason = &result.error.as_ref().unwrap().reason;
        assert!(reason.contains("converter exploded"), "{}", reason);
        // Partial archive removed by the builder's drop during unwinding.
        assert!(std::fs::read_dir(&fx.output).unwrap().next().is_none());

        // The worker survives and accepts new work.
        assert!(executor.submit(fx.request()).is_ok());
        let (_, state, _) = wait_finished(&executor);
        assert_eq!(state, ExecutorState::Failed);
        executor.shutdown();
    }

    #[test]
    fn test_panic_keeps_partial_progress() {
        let fx = Fixture::new(&["a.docx", "bad.docx", "boom.docx"]);
        let executor =
            BackgroundExecutor::new(Arc::clone(&fx.config), Arc::new(PanickingConverter)).unwrap();

        executor.submit(fx.request()).unwrap();
        let (_, state, result) = wait_finished(&executor);

        assert_eq!(state, ExecutorState::Failed);
        assert!(!result.success);
        assert_eq!(result.items_total, 3);
        assert_eq!(result.succeeded_count, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].name, "bad");
        assert!(result.members.is_empty());
        assert!(std::fs::read_dir(&fx.output).unwrap().next().is_none());
        executor.shutdown();
    }
}
