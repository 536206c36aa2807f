//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the push worker.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Delivery model
//! - A `Message` is accepted by the provider and tagged with a `CorrelationId`
//! - Every accepted send produces exactly one `ProviderResponse`
//! - Responses are paired with their message by correlation id, never by arrival order

mod config;
mod correlation_id;
mod error;
mod feedback;
mod message;
mod sink;
mod stats;

pub use config::*;
pub use correlation_id::CorrelationId;
pub use error::*;
pub use feedback::*;
pub use message::*;
pub use sink::*;
pub use stats::*;
