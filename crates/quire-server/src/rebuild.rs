//! Serialized rebuilds driven by change notifications.

use quire_static::{BuildError, BuildResult, StaticBuilder};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// What happened to a rebuild request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A rebuild was queued
    Queued,
    /// A rebuild was already queued and will cover this request
    Coalesced,
    /// The worker has stopped
    Closed,
}

/// Counters describing finished rebuilds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStatus {
    pub succeeded: u64,
    pub failed: u64,
}

impl RebuildStatus {
    /// Total rebuilds run so far.
    pub fn runs(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Queue of depth one in front of a single rebuild worker.
///
/// The worker owns the builder, so at most one build runs at a time. While a
/// build runs, any number of requests collapse into one follow-up build.
/// Every build is a full rebuild; failures are logged and never stop the
/// worker.
pub struct RebuildQueue {
    tx: mpsc::Sender<()>,
    status: watch::Receiver<RebuildStatus>,
    worker: JoinHandle<()>,
}

/// One full build, run on the blocking pool.
type BuildJob = Box<dyn FnMut() -> Result<BuildResult, BuildError> + Send>;

impl RebuildQueue {
    /// Spawn the worker on the current runtime.
    ///
    /// If a build panics, the worker continues with a fresh builder made from
    /// the same configuration.
    pub fn spawn(builder: StaticBuilder) -> Self {
        let config = builder.config().clone();
        let mut initial = Some(builder);

        Self::spawn_with(move || {
            let mut builder = initial
                .take()
                .unwrap_or_else(|| StaticBuilder::new(config.clone()));
            Box::new(move || builder.build()) as BuildJob
        })
    }

    /// Spawn a worker whose builds come from `make_job`, called once up front
    /// and again after every panic.
    fn spawn_with<F>(make_job: F) -> Self
    where
        F: FnMut() -> BuildJob + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let (status_tx, status) = watch::channel(RebuildStatus::default());

        let worker = tokio::spawn(run_worker(make_job, rx, status_tx));

        Self { tx, status, worker }
    }

    /// Ask for a rebuild.
    pub fn request(&self) -> RequestOutcome {
        match self.tx.try_send(()) {
            Ok(()) => RequestOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(())) => RequestOutcome::Coalesced,
            Err(mpsc::error::TrySendError::Closed(())) => RequestOutcome::Closed,
        }
    }

    /// Subscribe to rebuild counters.
    pub fn status(&self) -> watch::Receiver<RebuildStatus> {
        self.status.clone()
    }

    /// Stop accepting requests and wait for a running build to finish.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::error!("Rebuild worker stopped abnormally: {}", e);
        }
    }
}

async fn run_worker<F>(
    mut make_job: F,
    mut rx: mpsc::Receiver<()>,
    status: watch::Sender<RebuildStatus>,
) where
    F: FnMut() -> BuildJob + Send + 'static,
{
    let mut idle = Some(make_job());

    while rx.recv().await.is_some() {
        tracing::info!("Rebuilding...");

        let mut job = idle.take().unwrap_or_else(&mut make_job);
        let joined = tokio::task::spawn_blocking(move || {
            let result = job();
            (job, result)
        })
        .await;

        let result = match joined {
            Ok((job, result)) => {
                idle = Some(job);
                result
            }
            Err(e) => {
                tracing::error!("Rebuild panicked: {}. Starting over with a fresh builder", e);
                status.send_modify(|s| s.failed += 1);
                continue;
            }
        };

        match result {
            Ok(result) => {
                tracing::info!(
                    "Rebuild complete: {} pages, {} assets in {}ms",
                    result.pages,
                    result.assets.total(),
                    result.duration_ms
                );
                status.send_modify(|s| s.succeeded += 1);
            }
            Err(e) => {
                tracing::error!("Rebuild failed: {}", e);
                status.send_modify(|s| s.failed += 1);
            }
        }
    }
}
