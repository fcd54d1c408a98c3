use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use binder_logging::{binder_error, binder_info, binder_warn};

use crate::binder::{BindError, SeriesBinder};
use crate::config::EngineConfig;
use crate::fetch::Fetcher;
use crate::sink::ChannelSink;
use crate::{EngineEvent, JobId, JobProgress, Stage};

enum EngineCommand {
    Enqueue { job_id: JobId, url: String },
}

const WORKER_POLL: Duration = Duration::from_millis(100);

/// Background worker binding queued series one at a time.
///
/// Dropping the handle lets the worker finish the job in progress and exit.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: thread::JoinHandle<()>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        Self::spawn(move || SeriesBinder::new(config))
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::spawn(move || SeriesBinder::with_fetcher(config, fetcher))
    }

    fn spawn<F>(make_binder: F) -> Self
    where
        F: FnOnce() -> Result<SeriesBinder, BindError> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker_tx = event_tx.clone();

        let worker = thread::spawn(move || {
            let binder = make_binder();
            if let Err(err) = &binder {
                binder_error!("engine unavailable: {}", err);
            }
            let sink = ChannelSink::new(worker_tx.clone());

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Enqueue { job_id, url } => {
                        let result = match &binder {
                            Ok(binder) => binder.bind(job_id, &url, &sink),
                            Err(err) => Err(BindError::Config(err.to_string())),
                        };
                        let result = result.map_err(|err| {
                            binder_warn!("job {} ({}) failed: {}", job_id, url, err);
                            err.to_failure()
                        });
                        let _ = worker_tx.send(EngineEvent::JobCompleted { job_id, result });
                    }
                }
            }
            binder_info!("engine worker stopped");
        });

        Self {
            cmd_tx,
            event_tx,
            event_rx,
            worker,
        }
    }

    pub fn enqueue(&self, job_id: JobId, url: impl Into<String>) {
        let _ = self
            .event_tx
            .send(EngineEvent::Progress(JobProgress::stage(job_id, Stage::Queued)));
        let _ = self.cmd_tx.send(EngineCommand::Enqueue {
            job_id,
            url: url.into(),
        });
    }

    /// Block until the next event. `None` once the worker is gone and every
    /// event it sent has been drained.
    pub fn recv(&self) -> Option<EngineEvent> {
        loop {
            match self.event_rx.recv_timeout(WORKER_POLL) {
                Ok(event) => return Some(event),
                Err(mpsc::RecvTimeoutError::Timeout) if self.worker.is_finished() => {
                    return self.event_rx.try_recv().ok();
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}
