//! ReporterSet construction from `PusherConfig`

use std::sync::Arc;

use contracts::{
    FeedbackReporter, InvalidTokenHandler, PusherConfig, ReporterConcern, ReporterConfig,
    ReporterType, StatsReporter,
};
use observability::MetricsStatsReporter;
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::fanout::ReporterSet;
use crate::sinks::{
    FileFeedbackReporter, InMemoryTokenStore, LogFeedbackReporter, LogInvalidTokenHandler,
    LogStatsReporter, NetworkFeedbackReporter, TokenStoreHandler,
};

/// Build every configured sink, in configuration order
#[instrument(
    name = "dispatcher_build_reporters",
    skip(config),
    fields(
        feedback = config.feedback.len(),
        stats = config.stats.len(),
        invalid_token = config.invalid_token.len()
    )
)]
pub async fn build_reporters(config: &PusherConfig) -> Result<ReporterSet, DispatcherError> {
    let mut builder = ReporterSet::builder();

    for reporter in &config.feedback {
        builder = builder.feedback(create_feedback(reporter).await?);
    }
    for reporter in &config.stats {
        builder = builder.stats(create_stats(reporter)?);
    }
    for reporter in &config.invalid_token {
        builder = builder.invalid_token(create_invalid_token(reporter)?);
    }

    let set = builder.build();
    info!(names = ?set.names(), "Reporters created");
    Ok(set)
}

async fn create_feedback(
    config: &ReporterConfig,
) -> Result<Arc<dyn FeedbackReporter>, DispatcherError> {
    match config.reporter_type {
        ReporterType::Log => Ok(Arc::new(LogFeedbackReporter::new(&config.name))),
        ReporterType::File => {
            let sink = FileFeedbackReporter::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(sink))
        }
        ReporterType::Network => {
            let sink = NetworkFeedbackReporter::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(sink))
        }
        other => Err(unsupported(config, ReporterConcern::Feedback, other)),
    }
}

fn create_stats(config: &ReporterConfig) -> Result<Arc<dyn StatsReporter>, DispatcherError> {
    match config.reporter_type {
        ReporterType::Log => Ok(Arc::new(LogStatsReporter::new(&config.name))),
        ReporterType::Metrics => Ok(Arc::new(MetricsStatsReporter::new(&config.name))),
        other => Err(unsupported(config, ReporterConcern::Stats, other)),
    }
}

fn create_invalid_token(
    config: &ReporterConfig,
) -> Result<Arc<dyn InvalidTokenHandler>, DispatcherError> {
    match config.reporter_type {
        ReporterType::Log => Ok(Arc::new(LogInvalidTokenHandler::new(&config.name))),
        ReporterType::Memory => {
            let store = InMemoryTokenStore::new(&config.name);
            let store = match (config.params.get("app"), config.params.get("tokens")) {
                (Some(app), Some(tokens)) => store.with_tokens(
                    app,
                    tokens.split(',').map(str::trim).filter(|t| !t.is_empty()),
                ),
                _ => store,
            };
            Ok(Arc::new(TokenStoreHandler::new(
                &config.name,
                Arc::new(store),
            )))
        }
        other => Err(unsupported(config, ReporterConcern::InvalidToken, other)),
    }
}

fn unsupported(
    config: &ReporterConfig,
    concern: ReporterConcern,
    reporter_type: ReporterType,
) -> DispatcherError {
    DispatcherError::sink_creation(
        &config.name,
        format!(
            "{reporter_type:?} reporter is not supported for {}",
            concern.as_str()
        ),
    )
}
