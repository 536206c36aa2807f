//! Pusher error types

use contracts::ContractError;
use dispatcher::DispatcherError;
use ingestion::{BrokerError, IngestionError};
use thiserror::Error;

/// Startup and lifecycle errors
#[derive(Debug, Error)]
pub enum PusherError {
    /// The provider's response stream was already taken by another consumer
    #[error("provider '{provider}' response stream is not available")]
    ResponsesUnavailable { provider: String },

    /// OS signal handler could not be installed
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// Broker could not be created
    #[error("failed to create broker: {0}")]
    Broker(#[from] BrokerError),

    /// Intake failure
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Reporter construction failure
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ContractError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, PusherError>;
