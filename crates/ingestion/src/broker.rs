//! BrokerSource trait - external broker client abstraction
//!
//! The queue's consume loop only needs one operation from a broker: pull the
//! next message. Partitioning, offsets and retries stay inside the client.

use contracts::Message;

use crate::error::BrokerError;

/// Message source behind a queue
///
/// `poll` waits at most one poll interval. `Ok(None)` means nothing arrived
/// during that interval, which gives the consume loop a chance to observe a
/// stop request between reads.
#[trait_variant::make(BrokerSource: Send)]
pub trait LocalBrokerSource {
    /// Broker name (used for logging)
    fn name(&self) -> &str;

    /// Pull the next message
    ///
    /// # Errors
    /// - `BrokerError::Malformed`: this message is skipped, consumption continues
    /// - anything else: the consume loop exits
    async fn poll(&mut self) -> Result<Option<Message>, BrokerError>;
}
