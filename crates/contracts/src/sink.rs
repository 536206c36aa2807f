//! Reporter traits - fan-out sink interfaces
//!
//! Three independent capabilities, each configured as an ordered set of
//! sinks. Sinks are shared (`Arc<dyn ...>`) and called through `&self`, so
//! implementations that hold mutable state use interior mutability.

use async_trait::async_trait;

use crate::{ContractError, StatsEvent};

/// Receives serialized feedback records
#[async_trait]
pub trait FeedbackReporter: Send + Sync {
    /// Reporter name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one feedback record.
    ///
    /// `payload` is the canonical JSON encoding of the record; every reporter
    /// in a set receives identical bytes.
    ///
    /// # Errors
    /// Returns a transport error; callers log it and continue with the next reporter.
    async fn send_feedback(&self, payload: &[u8]) -> Result<(), ContractError>;
}

/// Receives runtime samples and per-notification counters
#[async_trait]
pub trait StatsReporter: Send + Sync {
    fn name(&self) -> &str;

    async fn report(&self, event: &StatsEvent) -> Result<(), ContractError>;
}

/// Removes or marks destination tokens the provider reported as invalid
#[async_trait]
pub trait InvalidTokenHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Handle one invalid token.
    ///
    /// Must be idempotent: handling a token that is already gone is a no-op.
    async fn handle_invalid_token(&self, app: &str, token: &str) -> Result<(), ContractError>;
}
