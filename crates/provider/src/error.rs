//! Provider error types

use thiserror::Error;

/// Synchronous send rejection
///
/// Returned by `PushProvider::push` when a message is refused before any I/O
/// is started. No response will follow for a rejected message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Message refused by the provider client
    #[error("message rejected: {reason}")]
    Rejected { reason: String },

    /// Serialized payload exceeds the provider limit
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl ProviderError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ProviderError>;
