//! Stats reporter backed by the `metrics` facade

use async_trait::async_trait;
use contracts::{ContractError, StatsEvent, StatsReporter};
use metrics::{counter, gauge, histogram};

/// Publishes stats events as Prometheus series
pub struct MetricsStatsReporter {
    name: String,
}

impl MetricsStatsReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl StatsReporter for MetricsStatsReporter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn report(&self, event: &StatsEvent) -> Result<(), ContractError> {
        match event {
            StatsEvent::Runtime(sample) => {
                gauge!("pusher_runtime_alive_tasks").set(sample.alive_tasks as f64);
                gauge!("pusher_runtime_worker_threads").set(sample.worker_threads as f64);
                gauge!("pusher_process_resident_bytes").set(sample.resident_bytes as f64);
                gauge!("pusher_process_virtual_bytes").set(sample.virtual_bytes as f64);
                histogram!("pusher_runtime_sample_duration_ms")
                    .record(sample.sample_duration.as_secs_f64() * 1000.0);
            }
            StatsEvent::NotificationSent { app } => {
                counter!("pusher_notifications_sent_total", "app" => app.clone()).increment(1);
            }
            StatsEvent::NotificationSuccess { app } => {
                counter!("pusher_notifications_success_total", "app" => app.clone()).increment(1);
            }
            StatsEvent::NotificationFailure { app, .. } => {
                counter!("pusher_notifications_failure_total", "app" => app.clone()).increment(1);
            }
        }
        Ok(())
    }
}
