//! Supervisor: owns the event-source tasks and the shutdown path.
//!
//! ```text
//! Inputs to run():
//!   Vec<SourceRef> ──► Supervisor::run(sources, worker, sink)
//!
//! Spawn:
//!   PipeSource[0] ... PollSource[N-1]
//!       │                  │
//!       └──► one JoinSet task per source, child CancellationToken each
//!                └──► restart loop: run() → Err? → backoff sleep → run()
//!
//! Dispatch:
//!   sources ── dispatch ──► bounded queue ──► DispatchWorker ──► EventSink
//!
//! Shutdown path:
//!   OS signal (or shutdown_handle().cancel())
//!     └─► runtime token cancel → propagates to child tokens
//!     └─► wait up to Config::grace for all source tasks to join
//!            ├─ Ok            → drain dispatch queue, return Ok
//!            └─ grace exceeded → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - A source returning `Err` is restarted after a
//!   [`RetryPolicy`](super::RetryPolicy) delay; a
//!   source returning `Ok` (cancellation) is done.
//! - Liveness is observable: the supervisor tracks which sources are still
//!   running and names the stuck ones when the grace period is exceeded.
//! - The dispatch worker outlives the sources, so events already queued at
//!   shutdown still reach the sink.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::sources::SourceRef;

use super::shutdown;
use super::sink::{DispatchWorker, EventSink};

/// Names of the sources currently running, for shutdown diagnostics.
#[derive(Default)]
struct AliveSet {
    names: Mutex<BTreeSet<String>>,
}

impl AliveSet {
    fn insert(&self, name: &str) {
        if let Ok(mut names) = self.names.lock() {
            names.insert(name.to_owned());
        }
    }

    fn remove(&self, name: &str) {
        if let Ok(mut names) = self.names.lock() {
            names.remove(name);
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.names
            .lock()
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Coordinates event-source tasks, dispatch, and graceful shutdown.
pub struct Supervisor {
    cfg: Config,
    token: CancellationToken,
    alive: Arc<AliveSet>,
}

impl Supervisor {
    /// Creates a supervisor with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            token: CancellationToken::new(),
            alive: Arc::new(AliveSet::default()),
        }
    }

    /// Returns a handle that cancels the runtime when triggered.
    ///
    /// Equivalent to receiving a termination signal; useful for embedding and
    /// for tests.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs the sources and the dispatch worker until shutdown.
    ///
    /// Returns when all sources have stopped, either because cancellation was
    /// requested and everything stopped within [`Config::grace`], or with
    /// [`RuntimeError::GraceExceeded`] naming the stuck sources.
    pub async fn run(
        &self,
        sources: Vec<SourceRef>,
        worker: DispatchWorker,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), RuntimeError> {
        let worker_handle = tokio::spawn(worker.run(sink));

        let mut set = JoinSet::new();
        for source in sources {
            self.spawn_source(&mut set, source);
        }
        let result = self.drive_shutdown(&mut set).await;

        // All source tasks are gone, so every Dispatcher clone is dropped and
        // the worker drains the queue and exits.
        let _ = worker_handle.await;
        result
    }

    /// Spawns one source task with its own restart loop and child token.
    fn spawn_source(&self, set: &mut JoinSet<()>, source: SourceRef) {
        let ctx = self.token.child_token();
        let retry = self.cfg.retry;
        let alive = Arc::clone(&self.alive);

        set.spawn(async move {
            alive.insert(source.name());
            let mut attempt: u32 = 0;
            loop {
                match source.run(ctx.clone()).await {
                    Ok(()) => break,
                    Err(e) => {
                        attempt += 1;
                        let delay = retry.delay(attempt);
                        warn!(
                            source = source.name(),
                            error = %e,
                            attempt,
                            ?delay,
                            "event source failed; restarting"
                        );
                        tokio::select! {
                            _ = ctx.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
            alive.remove(source.name());
        });
    }

    /// Waits until all sources finish or a shutdown trigger arrives.
    async fn drive_shutdown(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {
                info!("termination signal received; shutting down");
                self.token.cancel();
                self.wait_all_with_grace(set).await
            }
            _ = self.token.cancelled() => {
                info!("shutdown requested; stopping sources");
                self.wait_all_with_grace(set).await
            }
            _ = async { while set.join_next().await.is_some() {} } => Ok(()),
        }
    }

    /// Waits for all source tasks to finish within the configured grace.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };

        match tokio::time::timeout(grace, done).await {
            Ok(_) => {
                info!("all sources stopped within grace");
                Ok(())
            }
            Err(_) => {
                let stuck = self.alive.snapshot();
                warn!(?grace, ?stuck, "grace exceeded; abandoning stuck sources");
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
