//! Log reporters - emit events via tracing

use async_trait::async_trait;
use contracts::{
    ContractError, FeedbackReporter, InvalidTokenHandler, StatsEvent, StatsReporter,
};
use tracing::{info, instrument, warn};

/// Feedback reporter that logs each record
pub struct LogFeedbackReporter {
    name: String,
}

impl LogFeedbackReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl FeedbackReporter for LogFeedbackReporter {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_feedback_send", skip(self, payload), fields(sink = %self.name))]
    async fn send_feedback(&self, payload: &[u8]) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            feedback = %String::from_utf8_lossy(payload),
            "Feedback"
        );
        Ok(())
    }
}

/// Stats reporter that logs runtime samples and notification events
pub struct LogStatsReporter {
    name: String,
}

impl LogStatsReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl StatsReporter for LogStatsReporter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn report(&self, event: &StatsEvent) -> Result<(), ContractError> {
        match event {
            StatsEvent::Runtime(sample) => info!(
                sink = %self.name,
                alive_tasks = sample.alive_tasks,
                worker_threads = sample.worker_threads,
                resident_bytes = sample.resident_bytes,
                virtual_bytes = sample.virtual_bytes,
                sample_us = sample.sample_duration.as_micros() as u64,
                "Runtime sample"
            ),
            StatsEvent::NotificationSent { app } => {
                info!(sink = %self.name, app = %app, "Notification sent")
            }
            StatsEvent::NotificationSuccess { app } => {
                info!(sink = %self.name, app = %app, "Notification delivered")
            }
            StatsEvent::NotificationFailure { app, reason } => {
                info!(sink = %self.name, app = %app, reason = %reason, "Notification failed")
            }
        }
        Ok(())
    }
}

/// Invalid-token handler that only logs
pub struct LogInvalidTokenHandler {
    name: String,
}

impl LogInvalidTokenHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl InvalidTokenHandler for LogInvalidTokenHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle_invalid_token(&self, app: &str, token: &str) -> Result<(), ContractError> {
        warn!(sink = %self.name, app = %app, token = %token, "Invalid token reported");
        Ok(())
    }
}
