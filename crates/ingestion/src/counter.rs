//! PendingCounter - in-flight send accounting
//!
//! Every message handed to the provider is counted with `add()` and released
//! with exactly one `done()` when its terminal outcome is known. The drain
//! coordinator blocks on `wait_zero()`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::error;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    zero: Notify,
}

/// Shared counter of in-flight sends
///
/// Cloning yields another handle to the same counter. The value never goes
/// below zero: a `done()` without a matching `add()` is refused and logged.
#[derive(Debug, Clone, Default)]
pub struct PendingCounter {
    inner: Arc<Inner>,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more in-flight send, returning the new count
    pub fn add(&self) -> usize {
        self.inner.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Release one in-flight send
    ///
    /// Returns false (and leaves the counter untouched) when the counter is
    /// already zero.
    pub fn done(&self) -> bool {
        match self
            .inner
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                self.inner.zero.notify_waiters();
                true
            }
            Ok(_) => true,
            Err(_) => {
                error!("pending counter released below zero, ignoring");
                false
            }
        }
    }

    /// Current number of in-flight sends
    pub fn get(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Wait until the counter reaches zero
    ///
    /// Returns immediately if it is already zero.
    pub async fn wait_zero(&self) {
        loop {
            let notified = self.inner.zero.notified();
            tokio::pin!(notified);
            // Register before checking so a release between check and await is not lost
            notified.as_mut().enable();

            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}
