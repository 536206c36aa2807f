//! # Provider
//!
//! Push-notification provider client abstraction.
//!
//! Responsibilities:
//! - Accept messages without blocking and tag them with a `CorrelationId`
//! - Deliver one `ProviderResponse` per accepted message on a response stream
//! - Provide a loopback `MockProvider` for local runs and tests

pub mod client;
pub mod error;
pub mod mock_provider;

pub use client::PushProvider;
pub use error::{ProviderError, Result};
pub use mock_provider::MockProvider;
