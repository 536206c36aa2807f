//! Stats events and runtime samples

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-level runtime sample, taken periodically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeSample {
    /// Tasks currently alive on the async runtime
    pub alive_tasks: usize,

    /// Runtime worker threads
    pub worker_threads: usize,

    /// Resident set size (bytes)
    pub resident_bytes: u64,

    /// Virtual memory size (bytes)
    pub virtual_bytes: u64,

    /// Time spent taking the sample
    pub sample_duration: Duration,
}

/// Event delivered to stats reporters
#[derive(Debug, Clone, PartialEq)]
pub enum StatsEvent {
    /// Periodic runtime sample
    Runtime(RuntimeSample),
    /// A message was handed to the provider
    NotificationSent { app: String },
    /// The provider confirmed delivery
    NotificationSuccess { app: String },
    /// Delivery failed (rejected, invalid token or transient failure)
    NotificationFailure { app: String, reason: String },
}

impl StatsEvent {
    /// Short kind name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Runtime(_) => "runtime",
            Self::NotificationSent { .. } => "sent",
            Self::NotificationSuccess { .. } => "success",
            Self::NotificationFailure { .. } => "failure",
        }
    }
}
