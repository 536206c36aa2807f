//! Message and provider response types
//!
//! `Message` is the unit of work pulled from the queue. `ProviderResponse`
//! is what the provider reports back for every accepted send.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::CorrelationId;

/// A push notification request, as dequeued from the broker.
///
/// Immutable once dequeued: the dispatch path moves it by value into the
/// provider and gets it back inside the matching `ProviderResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Destination device token
    pub token: String,

    /// Application the token belongs to
    pub app: String,

    /// Provider payload (opaque to the worker)
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Message {
    pub fn new(
        token: impl Into<String>,
        app: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            token: token.into(),
            app: app.into(),
            payload,
        }
    }
}

/// Classified delivery outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Provider accepted the notification
    Success,
    /// Provider reported the destination token as no longer valid
    InvalidToken(String),
    /// Delivery failed for a reason that does not invalidate the token
    TransientFailure(String),
}

impl Outcome {
    /// Stable label (used for metrics and feedback status)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidToken(_) => "invalid_token",
            Self::TransientFailure(_) => "transient_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Response emitted by the provider for one accepted send
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Id returned by the provider when the send was accepted
    pub correlation_id: CorrelationId,

    /// The message that was sent
    pub message: Message,

    /// Classified outcome
    pub outcome: Outcome,

    /// Time between acceptance and response
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_from_json_without_payload() {
        let msg: Message = serde_json::from_str(r#"{"token":"abc","app":"game"}"#).unwrap();
        assert_eq!(msg.token, "abc");
        assert_eq!(msg.app, "game");
        assert!(msg.payload.is_null());
    }

    #[test]
    fn test_message_keeps_payload() {
        let msg = Message::new("abc", "game", json!({"aps": {"alert": "hi"}}));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["aps"]["alert"], "hi");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.label(), "success");
        assert_eq!(Outcome::InvalidToken("t".into()).label(), "invalid_token");
        assert_eq!(
            Outcome::TransientFailure("boom".into()).label(),
            "transient_failure"
        );
        assert!(Outcome::Success.is_success());
    }
}
