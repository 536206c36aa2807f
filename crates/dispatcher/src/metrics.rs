//! Fan-out and dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for one reporter concern
#[derive(Debug, Default)]
pub struct FanoutMetrics {
    /// Fan-out calls
    calls: AtomicU64,
    /// Successful per-sink deliveries
    delivered: AtomicU64,
    /// Failed per-sink deliveries
    failed: AtomicU64,
    /// Calls aborted before any delivery (serialization failure)
    aborted: AtomicU64,
}

impl FanoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_calls(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_aborted(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> FanoutSnapshot {
        FanoutSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of fan-out counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutSnapshot {
    pub calls: u64,
    pub delivered: u64,
    pub failed: u64,
    pub aborted: u64,
}

/// Dispatch path counters
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages taken off the message channel
    received: AtomicU64,
    /// Messages accepted by the provider
    dispatched: AtomicU64,
    /// Messages rejected synchronously by the provider
    rejected: AtomicU64,
    /// Responses settled
    responses: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_responses(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            responses: self.responses.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub received: u64,
    pub dispatched: u64,
    pub rejected: u64,
    pub responses: u64,
}
