//! Push provider abstraction
//!
//! A provider accepts messages without blocking and reports each terminal
//! outcome later on its response stream.

use async_channel::Receiver;
use contracts::{CorrelationId, Message, ProviderResponse};

use crate::error::Result;

/// Push-notification provider client
pub trait PushProvider: Send + Sync {
    /// Provider name (used for logging)
    fn name(&self) -> &str;

    /// Hand a message to the provider
    ///
    /// Must not block: network I/O happens on the provider's own tasks. An
    /// accepted message yields exactly one `ProviderResponse` carrying the
    /// returned correlation id.
    ///
    /// # Errors
    /// The message was refused synchronously; no response will follow.
    fn push(&self, message: Message) -> Result<CorrelationId>;

    /// Take the response stream
    ///
    /// Returns `None` after the first call: there is a single consumer.
    fn take_responses(&self) -> Option<Receiver<ProviderResponse>>;
}
