//! Feedback payload
//!
//! The canonical record sent to every feedback reporter. It is serialized once
//! (JSON) per fan-out call and the same bytes are handed to each reporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CorrelationId, Message, Outcome, ProviderResponse};

/// Delivery status carried in feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Success,
    InvalidToken,
    TransientFailure,
}

/// Feedback record for one terminal delivery outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Absent when the provider rejected the message before accepting it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,

    pub app: String,

    pub token: String,

    pub status: FeedbackStatus,

    /// Failure reason (failures only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Build feedback from an asynchronous provider response
    pub fn from_response(response: &ProviderResponse) -> Self {
        let (status, reason) = match &response.outcome {
            Outcome::Success => (FeedbackStatus::Success, None),
            Outcome::InvalidToken(_) => (
                FeedbackStatus::InvalidToken,
                Some("destination token is no longer valid".to_string()),
            ),
            Outcome::TransientFailure(err) => (FeedbackStatus::TransientFailure, Some(err.clone())),
        };

        Self {
            correlation_id: Some(response.correlation_id),
            app: response.message.app.clone(),
            token: response.message.token.clone(),
            status,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Build feedback for a message the provider refused synchronously
    pub fn rejected(message: &Message, reason: impl Into<String>) -> Self {
        Self {
            correlation_id: None,
            app: message.app.clone(),
            token: message.token.clone(),
            status: FeedbackStatus::TransientFailure,
            reason: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn response(outcome: Outcome) -> ProviderResponse {
        ProviderResponse {
            correlation_id: CorrelationId::new(),
            message: Message::new("tok-1", "game", json!({})),
            outcome,
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_success_feedback_has_no_reason() {
        let fb = Feedback::from_response(&response(Outcome::Success));
        assert_eq!(fb.status, FeedbackStatus::Success);
        assert!(fb.reason.is_none());

        let value = serde_json::to_value(&fb).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn test_transient_failure_carries_error() {
        let fb = Feedback::from_response(&response(Outcome::TransientFailure("timeout".into())));
        assert_eq!(fb.status, FeedbackStatus::TransientFailure);
        assert_eq!(fb.reason.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_rejected_has_no_correlation_id() {
        let msg = Message::new("tok-2", "game", json!({}));
        let fb = Feedback::rejected(&msg, "payload too large");
        assert!(fb.correlation_id.is_none());
        assert_eq!(fb.token, "tok-2");

        let value = serde_json::to_value(&fb).unwrap();
        assert!(value.get("correlation_id").is_none());
        assert_eq!(value["status"], "transient_failure");
    }
}
