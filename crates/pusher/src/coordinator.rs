//! ShutdownCoordinator - bounded drain of in-flight sends
//!
//! State only moves forward: Running -> Draining -> Terminated. The state is
//! published on a watch channel so other tasks can wait on it.

use std::future::Future;
use std::time::Duration;

use ingestion::Queue;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownState {
    Running,
    Draining,
    Terminated,
}

/// Result of `ShutdownCoordinator::drain`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum DrainOutcome {
    /// Every in-flight send settled before the timeout
    Clean,
    /// The timeout elapsed with sends still in flight
    TimedOut { remaining: usize },
    /// A drain was already started by an earlier call
    AlreadyDraining,
}

impl DrainOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Drives the Running -> Draining -> Terminated transition
pub struct ShutdownCoordinator {
    graceful_timeout: Duration,
    state: watch::Sender<ShutdownState>,
}

impl ShutdownCoordinator {
    pub fn new(graceful_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            graceful_timeout,
            state,
        }
    }

    pub fn graceful_timeout(&self) -> Duration {
        self.graceful_timeout
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    /// Wait until the coordinator reaches `Terminated`
    pub async fn terminated(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|s| *s == ShutdownState::Terminated).await;
    }

    /// Stop intake and wait for in-flight sends, bounded by the graceful timeout
    ///
    /// Only the first call drains; later calls return `AlreadyDraining`
    /// immediately.
    pub async fn drain<Q: Queue>(&self, queue: &Q) -> DrainOutcome {
        self.drain_after(queue, std::future::ready(())).await
    }

    /// Like `drain`, but first waits for `intake_closed` so that messages
    /// still buffered in the message channel are counted before the wait
    /// for zero. Both waits share the one graceful timeout.
    #[instrument(name = "shutdown_drain", skip_all, fields(timeout_secs = self.graceful_timeout.as_secs_f64()))]
    pub async fn drain_after<Q, F>(&self, queue: &Q, intake_closed: F) -> DrainOutcome
    where
        Q: Queue,
        F: Future<Output = ()>,
    {
        let started = self.state.send_if_modified(|state| {
            if *state == ShutdownState::Running {
                *state = ShutdownState::Draining;
                true
            } else {
                false
            }
        });
        if !started {
            return DrainOutcome::AlreadyDraining;
        }

        queue.stop_consuming();
        let pending = queue.pending();
        info!(pending = pending.get(), "Draining in-flight sends");

        let begin = Instant::now();
        let settled = async {
            intake_closed.await;
            pending.wait_zero().await;
        };
        let outcome = match tokio::time::timeout(self.graceful_timeout, settled).await {
            Ok(()) => DrainOutcome::Clean,
            Err(_) => DrainOutcome::TimedOut {
                remaining: pending.get(),
            },
        };

        self.state.send_replace(ShutdownState::Terminated);

        match outcome {
            DrainOutcome::TimedOut { remaining } => warn!(
                remaining,
                waited_ms = begin.elapsed().as_millis() as u64,
                "Drain timed out, abandoning in-flight sends"
            ),
            _ => info!(
                waited_ms = begin.elapsed().as_millis() as u64,
                "Drain complete"
            ),
        }
        outcome
    }
}
