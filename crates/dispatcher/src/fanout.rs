//! ReporterSet - isolated fan-out to every configured sink
//!
//! Each call visits the sinks of one concern in configuration order. A
//! failing sink is logged with its name and counted; the remaining sinks still
//! receive the event and the caller never sees the sink error.

use std::sync::Arc;

use contracts::{FeedbackReporter, InvalidTokenHandler, StatsEvent, StatsReporter};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{FanoutMetrics, FanoutSnapshot};

const FEEDBACK: &str = "feedback";
const STATS: &str = "stats";
const INVALID_TOKEN: &str = "invalid_token";

/// Sinks of the three reporting concerns, fixed after build
#[derive(Default)]
pub struct ReporterSet {
    feedback: Vec<Arc<dyn FeedbackReporter>>,
    stats: Vec<Arc<dyn StatsReporter>>,
    invalid_token: Vec<Arc<dyn InvalidTokenHandler>>,
    feedback_metrics: FanoutMetrics,
    stats_metrics: FanoutMetrics,
    invalid_token_metrics: FanoutMetrics,
}

impl ReporterSet {
    pub fn builder() -> ReporterSetBuilder {
        ReporterSetBuilder::default()
    }

    /// Sink names per concern, in delivery order
    pub fn names(&self) -> ReporterNames {
        ReporterNames {
            feedback: self.feedback.iter().map(|r| r.name().to_string()).collect(),
            stats: self.stats.iter().map(|r| r.name().to_string()).collect(),
            invalid_token: self
                .invalid_token
                .iter()
                .map(|r| r.name().to_string())
                .collect(),
        }
    }

    /// Fan a stats event out to every stats reporter
    ///
    /// Returns the number of reporters that accepted the event.
    #[instrument(name = "fanout_stats", skip(self, event), fields(kind = event.kind()))]
    pub async fn report_stats(&self, event: &StatsEvent) -> usize {
        self.stats_metrics.inc_calls();
        let mut delivered = 0;
        for reporter in &self.stats {
            let result = reporter.report(event).await;
            if self.settle(STATS, reporter.name(), &self.stats_metrics, result) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Serialize `feedback` once and deliver identical bytes to every feedback reporter
    ///
    /// Returns the number of reporters that accepted the record.
    ///
    /// # Errors
    /// `DispatcherError::Serialization` when the record cannot be encoded; in
    /// that case no reporter is called.
    #[instrument(name = "fanout_feedback", skip_all)]
    pub async fn send_feedback<T: Serialize + ?Sized>(
        &self,
        feedback: &T,
    ) -> Result<usize, DispatcherError> {
        self.feedback_metrics.inc_calls();
        let payload = serde_json::to_vec(feedback).map_err(|e| {
            self.feedback_metrics.inc_aborted();
            DispatcherError::Serialization(e)
        })?;

        let mut delivered = 0;
        for reporter in &self.feedback {
            let result = reporter.send_feedback(&payload).await;
            if self.settle(FEEDBACK, reporter.name(), &self.feedback_metrics, result) {
                delivered += 1;
            }
        }
        debug!(delivered, bytes = payload.len(), "Feedback delivered");
        Ok(delivered)
    }

    /// Hand an invalid token to every handler
    ///
    /// Returns the number of handlers that succeeded.
    #[instrument(name = "fanout_invalid_token", skip(self), fields(app = %app))]
    pub async fn handle_invalid_token(&self, app: &str, token: &str) -> usize {
        self.invalid_token_metrics.inc_calls();
        let mut handled = 0;
        for handler in &self.invalid_token {
            let result = handler.handle_invalid_token(app, token).await;
            if self.settle(
                INVALID_TOKEN,
                handler.name(),
                &self.invalid_token_metrics,
                result,
            ) {
                handled += 1;
            }
        }
        handled
    }

    pub fn feedback_metrics(&self) -> FanoutSnapshot {
        self.feedback_metrics.snapshot()
    }

    pub fn stats_metrics(&self) -> FanoutSnapshot {
        self.stats_metrics.snapshot()
    }

    pub fn invalid_token_metrics(&self) -> FanoutSnapshot {
        self.invalid_token_metrics.snapshot()
    }

    fn settle(
        &self,
        concern: &'static str,
        sink: &str,
        metrics: &FanoutMetrics,
        result: Result<(), contracts::ContractError>,
    ) -> bool {
        let ok = result.is_ok();
        observability::record_sink_delivery(concern, sink, ok);
        match result {
            Ok(()) => metrics.inc_delivered(),
            Err(e) => {
                metrics.inc_failed();
                warn!(concern, sink, error = %e, "Sink delivery failed");
            }
        }
        ok
    }
}

/// Sink names per concern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterNames {
    pub feedback: Vec<String>,
    pub stats: Vec<String>,
    pub invalid_token: Vec<String>,
}

/// Builder for `ReporterSet`
#[derive(Default)]
pub struct ReporterSetBuilder {
    set: ReporterSet,
}

impl ReporterSetBuilder {
    pub fn feedback(mut self, reporter: Arc<dyn FeedbackReporter>) -> Self {
        self.set.feedback.push(reporter);
        self
    }

    pub fn stats(mut self, reporter: Arc<dyn StatsReporter>) -> Self {
        self.set.stats.push(reporter);
        self
    }

    pub fn invalid_token(mut self, handler: Arc<dyn InvalidTokenHandler>) -> Self {
        self.set.invalid_token.push(handler);
        self
    }

    pub fn build(self) -> ReporterSet {
        self.set
    }
}
