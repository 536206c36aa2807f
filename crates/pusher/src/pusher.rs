//! Pusher - process composition root
//!
//! 组装队列、provider、dispatcher 与 sinks，启动四个后台任务：
//! consume loop、intake loop、response loop、stats loop。
//! 收到关闭触发（信号、调用方 future 或 intake 终止）后执行一次有界 drain。

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::PusherConfig;
use contracts::PusherSettings;
use dispatcher::{build_reporters, DispatchSnapshot, FanoutSnapshot, MessageDispatcher, ReporterSet};
use ingestion::{BrokerQueue, ConfiguredBroker, Queue};
use observability::{ResponseSummary, RuntimeSampler};
use provider::{MockProvider, PushProvider};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info, instrument, warn};

use crate::coordinator::{DrainOutcome, ShutdownCoordinator};
use crate::error::{PusherError, Result};
use crate::signal::{ShutdownSignal, SignalListener};
use crate::stats_loop::StatsLoop;

/// Why the pusher began shutting down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// OS signal
    Signal(ShutdownSignal),
    /// Caller-supplied trigger completed
    Requested,
    /// Consume loop exited on its own
    IntakeStopped,
    /// Consume loop failed
    IntakeFailed(String),
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(sig) => write!(f, "signal ({sig:?})"),
            Self::Requested => write!(f, "requested"),
            Self::IntakeStopped => write!(f, "intake stopped"),
            Self::IntakeFailed(e) => write!(f, "intake failed: {e}"),
        }
    }
}

/// Final state of a pusher run
#[derive(Debug, Clone)]
pub struct PusherReport {
    pub reason: ShutdownReason,
    pub drain: DrainOutcome,
    pub uptime: Duration,
    pub dispatch: DispatchSnapshot,
    pub responses: ResponseSummary,
    pub feedback: FanoutSnapshot,
    pub stats: FanoutSnapshot,
    pub invalid_token: FanoutSnapshot,
    pub runtime_samples: u64,
}

/// Push worker, generic over the queue and the provider
pub struct Pusher<Q, P> {
    settings: PusherSettings,
    queue: Arc<Q>,
    provider: Arc<P>,
    reporters: Arc<ReporterSet>,
    sampler: Arc<RuntimeSampler>,
}

impl Pusher<BrokerQueue<ConfiguredBroker>, MockProvider> {
    /// Build every component described by `config`
    ///
    /// # Errors
    /// broker 或任一 sink 创建失败时返回错误
    #[instrument(name = "pusher_from_config", skip_all, fields(app = %config.pusher.app_name))]
    pub async fn from_config(config: &PusherConfig) -> Result<Self> {
        let broker = ConfiguredBroker::from_config(&config.queue, &config.pusher.app_name).await?;
        let queue = Arc::new(BrokerQueue::new(broker, config.queue.channel_capacity));
        let provider = Arc::new(MockProvider::new(&config.provider));
        let reporters = build_reporters(config).await?;

        Ok(Self::new(config.pusher.clone(), queue, provider, reporters))
    }
}

impl<Q, P> Pusher<Q, P>
where
    Q: Queue + 'static,
    P: PushProvider + 'static,
{
    pub fn new(
        settings: PusherSettings,
        queue: Arc<Q>,
        provider: Arc<P>,
        reporters: ReporterSet,
    ) -> Self {
        Self {
            settings,
            queue,
            provider,
            reporters: Arc::new(reporters),
            sampler: Arc::new(RuntimeSampler::new()),
        }
    }

    pub fn settings(&self) -> &PusherSettings {
        &self.settings
    }

    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    pub fn reporters(&self) -> &Arc<ReporterSet> {
        &self.reporters
    }

    /// Spawn the background loops
    ///
    /// # Errors
    /// provider 的响应流已被取走时返回 `ResponsesUnavailable`
    pub fn start(self) -> Result<RunningPusher<Q, P>> {
        let responses =
            self.provider
                .take_responses()
                .ok_or_else(|| PusherError::ResponsesUnavailable {
                    provider: self.provider.name().to_string(),
                })?;

        let dispatcher = Arc::new(MessageDispatcher::new(
            self.provider.clone(),
            self.reporters.clone(),
            self.queue.pending(),
        ));

        let response_loop = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.handle_responses(responses).await })
        };
        let intake_loop = tokio::spawn(dispatcher.clone().handle_messages(self.queue.messages()));
        let consume_loop = {
            let queue = self.queue.clone();
            tokio::spawn(async move { queue.consume_loop().await })
        };
        let stats_loop = StatsLoop::spawn(
            self.reporters.clone(),
            self.sampler.clone(),
            self.settings.stats_interval(),
        );

        let names = self.reporters.names();
        info!(
            app = %self.settings.app_name,
            provider = %self.provider.name(),
            feedback = ?names.feedback,
            stats = ?names.stats,
            invalid_token = ?names.invalid_token,
            "Pusher started"
        );

        Ok(RunningPusher {
            coordinator: ShutdownCoordinator::new(self.settings.graceful_shutdown_timeout()),
            queue: self.queue,
            dispatcher,
            consume_loop: Some(consume_loop),
            intake_loop: Some(intake_loop),
            response_loop,
            stats_loop,
            started: Instant::now(),
        })
    }

    /// Run until `trigger` completes, then drain
    pub async fn run_until<F>(self, trigger: F) -> Result<PusherReport>
    where
        F: Future<Output = ()>,
    {
        let mut running = self.start()?;
        let reason = running
            .wait_for(async {
                trigger.await;
                ShutdownReason::Requested
            })
            .await;
        Ok(running.shutdown(reason).await)
    }

    /// Run until SIGINT / SIGTERM, then drain
    pub async fn run(self) -> Result<PusherReport> {
        let mut signals = SignalListener::new()?;
        let mut running = self.start()?;
        let reason = running
            .wait_for(async move { ShutdownReason::Signal(signals.recv().await) })
            .await;
        Ok(running.shutdown(reason).await)
    }
}

/// Handles of a started pusher
pub struct RunningPusher<Q, P> {
    coordinator: ShutdownCoordinator,
    queue: Arc<Q>,
    dispatcher: Arc<MessageDispatcher<P>>,
    /// None once joined
    consume_loop: Option<JoinHandle<ingestion::Result<()>>>,
    intake_loop: Option<JoinHandle<()>>,
    response_loop: JoinHandle<()>,
    stats_loop: StatsLoop,
    started: Instant,
}

impl<Q, P> RunningPusher<Q, P>
where
    Q: Queue + 'static,
    P: PushProvider + 'static,
{
    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    pub fn dispatcher(&self) -> &Arc<MessageDispatcher<P>> {
        &self.dispatcher
    }

    /// Wait for `trigger`, or for the consume loop to end first
    pub async fn wait_for<F>(&mut self, trigger: F) -> ShutdownReason
    where
        F: Future<Output = ShutdownReason>,
    {
        let consume_exit = {
            let consume_loop = self.consume_loop.as_mut();
            async move {
                match consume_loop {
                    Some(handle) => joined_result(handle.await),
                    None => std::future::pending().await,
                }
            }
        };

        let exited = tokio::select! {
            reason = trigger => return reason,
            exited = consume_exit => exited,
        };

        self.consume_loop = None;
        match exited {
            Ok(()) => {
                info!("Consume loop exited, shutting down");
                ShutdownReason::IntakeStopped
            }
            Err(e) => {
                error!(error = %e, "Consume loop failed, shutting down");
                ShutdownReason::IntakeFailed(e)
            }
        }
    }

    /// Drain in-flight sends and stop every loop
    ///
    /// The drain covers messages still buffered in the channel: it waits for
    /// the consume and intake loops to finish before waiting for the pending
    /// counter to reach zero, all within the graceful timeout.
    #[instrument(name = "pusher_shutdown", skip(self), fields(reason = %reason))]
    pub async fn shutdown(mut self, reason: ShutdownReason) -> PusherReport {
        info!("Shutting down");

        let consume_loop = self.consume_loop.take();
        let intake_loop = self.intake_loop.take();
        let abort_handles: Vec<AbortHandle> = consume_loop
            .iter()
            .map(JoinHandle::abort_handle)
            .chain(intake_loop.iter().map(JoinHandle::abort_handle))
            .collect();

        let intake_closed = async move {
            if let Some(handle) = consume_loop {
                if let Err(e) = joined_result(handle.await) {
                    warn!(error = %e, "Consume loop failed during drain");
                }
            }
            if let Some(handle) = intake_loop {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Intake loop ended abnormally");
                }
            }
        };

        let drain = self
            .coordinator
            .drain_after(self.queue.as_ref(), intake_closed)
            .await;

        // No-ops for loops that already finished
        for handle in abort_handles {
            handle.abort();
        }
        self.response_loop.abort();
        let _ = self.response_loop.await;
        let runtime_samples = self.stats_loop.cancel().await;

        let reporters = self.dispatcher.reporters();
        let report = PusherReport {
            reason,
            drain,
            uptime: self.started.elapsed(),
            dispatch: self.dispatcher.metrics(),
            responses: self.dispatcher.response_summary(),
            feedback: reporters.feedback_metrics(),
            stats: reporters.stats_metrics(),
            invalid_token: reporters.invalid_token_metrics(),
            runtime_samples,
        };

        info!(
            drain = ?report.drain,
            received = report.dispatch.received,
            responses = report.dispatch.responses,
            uptime_secs = report.uptime.as_secs_f64(),
            "Pusher stopped"
        );
        report
    }
}

fn joined_result(
    joined: std::result::Result<ingestion::Result<()>, tokio::task::JoinError>,
) -> std::result::Result<(), String> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("consume loop task ended abnormally: {e}")),
    }
}
