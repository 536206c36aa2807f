//! MessageDispatcher - intake loop and response loop
//!
//! The intake loop takes messages off the queue channel, counts each one in
//! the shared `PendingCounter` and hands it to the provider on its own task.
//! The response loop settles provider responses. Every counted message is
//! released exactly once: by `settle` for accepted messages, by `reject` for
//! messages the provider refused synchronously.

use std::sync::{Arc, Mutex};

use async_channel::Receiver;
use contracts::{Feedback, Message, Outcome, ProviderResponse, StatsEvent};
use ingestion::PendingCounter;
use observability::metrics::{
    record_dispatch_rejected, record_message_dispatched, record_pending, record_response,
};
use observability::{ResponseMetricsAggregator, ResponseSummary};
use provider::{ProviderError, PushProvider};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::fanout::ReporterSet;
use crate::metrics::{DispatchMetrics, DispatchSnapshot};

/// Failure reason reported to stats for invalid destination tokens
const INVALID_TOKEN_REASON: &str = "invalid token";

/// Routes messages to the provider and provider responses to the reporters
pub struct MessageDispatcher<P> {
    provider: Arc<P>,
    reporters: Arc<ReporterSet>,
    pending: PendingCounter,
    metrics: DispatchMetrics,
    responses: Mutex<ResponseMetricsAggregator>,
}

impl<P: PushProvider + 'static> MessageDispatcher<P> {
    pub fn new(provider: Arc<P>, reporters: Arc<ReporterSet>, pending: PendingCounter) -> Self {
        Self {
            provider,
            reporters,
            pending,
            metrics: DispatchMetrics::new(),
            responses: Mutex::new(ResponseMetricsAggregator::new()),
        }
    }

    pub fn pending(&self) -> &PendingCounter {
        &self.pending
    }

    pub fn reporters(&self) -> &Arc<ReporterSet> {
        &self.reporters
    }

    pub fn metrics(&self) -> DispatchSnapshot {
        self.metrics.snapshot()
    }

    /// Outcome counts and response latency so far
    pub fn response_summary(&self) -> ResponseSummary {
        self.responses
            .lock()
            .map(|agg| agg.summary())
            .unwrap_or_default()
    }

    /// Intake loop: runs until the message channel is closed and drained
    ///
    /// Every message is counted before this loop hands it off, so the
    /// pending counter covers it by the time the next message is received.
    #[instrument(name = "dispatcher_intake_loop", skip_all, fields(provider = %self.provider.name()))]
    pub async fn handle_messages(self: Arc<Self>, rx: Receiver<Message>) {
        info!("Intake loop started");

        while let Ok(message) = rx.recv().await {
            self.metrics.inc_received();
            record_pending(self.pending.add());

            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move { dispatcher.dispatch(message).await });
        }

        let snapshot = self.metrics.snapshot();
        info!(
            received = snapshot.received,
            pending = self.pending.get(),
            "Message channel closed, intake loop finished"
        );
    }

    /// Response loop: settles responses until the provider's stream closes
    #[instrument(name = "dispatcher_response_loop", skip_all, fields(provider = %self.provider.name()))]
    pub async fn handle_responses(&self, rx: Receiver<ProviderResponse>) {
        info!("Response loop started");

        while let Ok(response) = rx.recv().await {
            self.settle(response).await;
        }

        info!(
            responses = self.metrics.snapshot().responses,
            "Response stream closed, response loop finished"
        );
    }

    async fn dispatch(&self, message: Message) {
        self.reporters
            .report_stats(&StatsEvent::NotificationSent {
                app: message.app.clone(),
            })
            .await;

        match self.provider.push(message.clone()) {
            Ok(correlation_id) => {
                self.metrics.inc_dispatched();
                record_message_dispatched(&message.app);
                trace!(%correlation_id, app = %message.app, "Message handed to provider");
            }
            Err(e) => self.reject(&message, e).await,
        }
    }

    async fn reject(&self, message: &Message, error: ProviderError) {
        self.metrics.inc_rejected();
        record_dispatch_rejected(&message.app);
        if let Ok(mut agg) = self.responses.lock() {
            agg.record_rejected();
        }
        warn!(app = %message.app, token = %message.token, error = %error, "Provider rejected message");

        let reason = error.to_string();
        self.reporters
            .report_stats(&StatsEvent::NotificationFailure {
                app: message.app.clone(),
                reason: reason.clone(),
            })
            .await;
        self.deliver_feedback(&Feedback::rejected(message, reason))
            .await;
        self.release();
    }

    #[instrument(
        name = "dispatcher_settle",
        skip_all,
        fields(correlation_id = %response.correlation_id, outcome = response.outcome.label())
    )]
    async fn settle(&self, response: ProviderResponse) {
        self.metrics.inc_responses();
        record_response(&response.outcome, response.elapsed);
        if let Ok(mut agg) = self.responses.lock() {
            agg.update(&response.outcome, response.elapsed);
        }

        let app = &response.message.app;
        let event = match &response.outcome {
            Outcome::Success => StatsEvent::NotificationSuccess { app: app.clone() },
            Outcome::InvalidToken(token) => {
                self.reporters.handle_invalid_token(app, token).await;
                StatsEvent::NotificationFailure {
                    app: app.clone(),
                    reason: INVALID_TOKEN_REASON.to_string(),
                }
            }
            Outcome::TransientFailure(reason) => {
                debug!(reason = %reason, "Transient delivery failure");
                StatsEvent::NotificationFailure {
                    app: app.clone(),
                    reason: reason.clone(),
                }
            }
        };
        self.reporters.report_stats(&event).await;
        self.deliver_feedback(&Feedback::from_response(&response))
            .await;

        self.release();
    }

    async fn deliver_feedback(&self, feedback: &Feedback) {
        if let Err(e) = self.reporters.send_feedback(feedback).await {
            error!(token = %feedback.token, error = %e, "Feedback dropped");
        }
    }

    fn release(&self) {
        if !self.pending.done() {
            warn!("Released a message that was not counted as pending");
        }
        record_pending(self.pending.get());
    }
}
