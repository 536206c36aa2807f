//! Intake metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Consume loop counters
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Messages pulled from the broker
    pub messages_received: AtomicU64,

    /// Messages published onto the message channel
    pub messages_published: AtomicU64,

    /// Malformed messages skipped
    pub malformed: AtomicU64,

    /// Message channel length after the last publish
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record message received
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("pusher_messages_received_total").increment(1);
    }

    /// Record message published to the channel
    pub fn record_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record malformed message
    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("pusher_messages_malformed_total").increment(1);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        metrics::gauge!("pusher_queue_len").set(len as f64);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_published: u64,
    pub malformed: u64,
    pub queue_len: usize,
}
