//! # Ingestion
//!
//! Queue abstraction for the dispatch worker.
//!
//! Responsibilities:
//! - Pull notification requests from a broker (`BrokerSource`)
//! - Publish them onto a bounded message channel (`Queue`)
//! - Own the shared in-flight counter (`PendingCounter`) used for drain
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{BrokerQueue, MockBroker, Queue};
//!
//! let queue = Arc::new(BrokerQueue::new(MockBroker::from_messages(messages), 100));
//! let rx = queue.messages();
//!
//! tokio::spawn({
//!     let queue = queue.clone();
//!     async move { queue.consume_loop().await }
//! });
//!
//! while let Ok(message) = rx.recv().await {
//!     // Dispatch message
//! }
//! ```

mod broker;
mod counter;
mod error;
mod factory;
mod json_lines;
mod metrics;
mod mock;
mod queue;

// Re-exports
pub use broker::{BrokerSource, LocalBrokerSource};
pub use contracts::Message;
pub use counter::PendingCounter;
pub use error::{BrokerError, IngestionError, Result};
pub use factory::ConfiguredBroker;
pub use json_lines::JsonLinesBroker;
pub use crate::metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockBroker, MockBrokerConfig};
pub use queue::{BrokerQueue, Queue};
