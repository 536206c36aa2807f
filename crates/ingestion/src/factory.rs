//! Broker selection from configuration

use contracts::{BrokerType, Message, QueueConfig};
use tracing::info;

use crate::broker::BrokerSource;
use crate::error::BrokerError;
use crate::json_lines::JsonLinesBroker;
use crate::mock::{MockBroker, MockBrokerConfig};

/// Broker built from `QueueConfig`
pub enum ConfiguredBroker {
    Mock(MockBroker),
    JsonLines(JsonLinesBroker),
}

impl ConfiguredBroker {
    /// Build the broker described by `config`
    ///
    /// `app_name` is the default application for generated messages.
    pub async fn from_config(config: &QueueConfig, app_name: &str) -> Result<Self, BrokerError> {
        let broker = &config.broker;
        let poll_interval = config.poll_interval();

        let built = match broker.broker_type {
            BrokerType::Mock => {
                let mock_config = MockBrokerConfig::from_params(
                    "mock_broker",
                    app_name,
                    &broker.params,
                    poll_interval,
                )
                .map_err(BrokerError::fatal)?;
                Self::Mock(MockBroker::new(mock_config))
            }
            BrokerType::JsonLines => {
                let path = broker
                    .params
                    .get("path")
                    .ok_or_else(|| BrokerError::fatal("json_lines broker requires 'path'"))?;
                Self::JsonLines(JsonLinesBroker::open("json_lines", path, poll_interval).await?)
            }
        };

        info!(broker = %built.name(), broker_type = ?broker.broker_type, "Broker created");
        Ok(built)
    }
}

impl BrokerSource for ConfiguredBroker {
    fn name(&self) -> &str {
        match self {
            Self::Mock(b) => b.name(),
            Self::JsonLines(b) => b.name(),
        }
    }

    async fn poll(&mut self) -> Result<Option<Message>, BrokerError> {
        match self {
            Self::Mock(b) => b.poll().await,
            Self::JsonLines(b) => b.poll().await,
        }
    }
}
