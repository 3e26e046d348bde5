use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use fastmusic_core::{DownloadJob, SearchId};
use fm_logging::{fm_debug, fm_error};
use futures_util::FutureExt;

use crate::orchestrator::run_download;
use crate::persist::AtomicFileWriter;
use crate::{Backend, BackendError, BackendSettings, EngineEvent, FailureKind, ReqwestBackend};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub output_dir: PathBuf,
}

enum EngineCommand {
    Search { search_id: SearchId, query: String },
    Download(DownloadJob),
    Health,
}

/// Runs backend work on a private tokio runtime.
///
/// Every enqueued command produces exactly one [`EngineEvent`], even when
/// the task panics. Commands run concurrently; events arrive in completion
/// order.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, BackendError> {
        let backend = ReqwestBackend::new(config.backend)?;
        Ok(Self::with_backend(
            Arc::new(backend),
            AtomicFileWriter::new(config.output_dir),
        ))
    }

    pub fn with_backend(backend: Arc<dyn Backend>, writer: AtomicFileWriter) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    fm_error!("failed to start engine runtime: {}", err);
                    fail_all(cmd_rx, event_tx, &err.to_string());
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let backend = backend.clone();
                let writer = writer.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = handle_command(backend.as_ref(), &writer, command).await;
                    let _ = event_tx.send(event);
                });
            }
            fm_debug!("engine command channel closed");
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Fails only when the engine thread is gone; no event will follow.
    pub fn enqueue_search(
        &self,
        search_id: SearchId,
        query: impl Into<String>,
    ) -> Result<(), BackendError> {
        self.send(EngineCommand::Search {
            search_id,
            query: query.into(),
        })
    }

    pub fn enqueue_download(&self, job: DownloadJob) -> Result<(), BackendError> {
        self.send(EngineCommand::Download(job))
    }

    pub fn enqueue_health(&self) -> Result<(), BackendError> {
        self.send(EngineCommand::Health)
    }

    fn send(&self, command: EngineCommand) -> Result<(), BackendError> {
        self.cmd_tx.send(command).map_err(|_| {
            fm_error!("engine thread is gone, command dropped");
            BackendError::new(FailureKind::Io, "Engine stopped")
        })
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    backend: &dyn Backend,
    writer: &AtomicFileWriter,
    command: EngineCommand,
) -> EngineEvent {
    match command {
        EngineCommand::Search { search_id, query } => {
            let result = AssertUnwindSafe(backend.search(&query))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(panicked("search")));
            EngineEvent::SearchCompleted { search_id, result }
        }
        EngineCommand::Download(job) => {
            let result = AssertUnwindSafe(run_download(backend, writer, &job))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(panicked("download")));
            EngineEvent::DownloadCompleted { id: job.id, result }
        }
        EngineCommand::Health => {
            let result = AssertUnwindSafe(backend.health())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(panicked("health check")));
            EngineEvent::HealthChecked { result }
        }
    }
}

fn panicked(what: &str) -> BackendError {
    fm_error!("{} task panicked", what);
    BackendError::new(FailureKind::Io, format!("Internal error during {what}"))
}

/// Answers every command with a failure when no runtime could be built.
fn fail_all(
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    reason: &str,
) {
    let error = BackendError::new(FailureKind::Io, format!("Engine unavailable: {reason}"));
    while let Ok(command) = cmd_rx.recv() {
        let event = match command {
            EngineCommand::Search { search_id, .. } => EngineEvent::SearchCompleted {
                search_id,
                result: Err(error.clone()),
            },
            EngineCommand::Download(job) => EngineEvent::DownloadCompleted {
                id: job.id,
                result: Err(error.clone()),
            },
            EngineCommand::Health => EngineEvent::HealthChecked {
                result: Err(error.clone()),
            },
        };
        let _ = event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use fastmusic_core::{AudioQuality, DownloadRequest, MediaSource};

    use super::*;

    fn stopped_engine() -> EngineHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        drop(cmd_rx);
        let (_event_tx, event_rx) = mpsc::channel();
        EngineHandle {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    #[test]
    fn enqueue_on_stopped_engine_is_an_error() {
        let engine = stopped_engine();
        let source = MediaSource::Search {
            video_id: "abc".to_string(),
        };
        let job = DownloadJob {
            id: source.download_id(),
            request: DownloadRequest {
                locator: source.locator(),
                quality: AudioQuality::Kbps128,
            },
            display_title: None,
        };

        let err = engine.enqueue_download(job).unwrap_err();
        assert_eq!(err.kind, FailureKind::Io);
        assert_eq!(err.message, "Engine stopped");
        assert!(engine.enqueue_search(1, "song").is_err());
        assert!(engine.enqueue_health().is_err());
        assert!(engine.try_recv().is_none());
    }
}
