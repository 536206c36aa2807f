//! Recording sinks for the unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{ContractError, FeedbackReporter, StatsEvent, StatsReporter};

#[derive(Default)]
pub struct RecordingStats {
    events: Mutex<Vec<StatsEvent>>,
}

impl RecordingStats {
    pub fn runtime_samples(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, StatsEvent::Runtime(_)))
            .count()
    }
}

#[async_trait]
impl StatsReporter for RecordingStats {
    fn name(&self) -> &str {
        "recording_stats"
    }

    async fn report(&self, event: &StatsEvent) -> Result<(), ContractError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingFeedback {
    records: Mutex<Vec<serde_json::Value>>,
}

impl RecordingFeedback {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedbackReporter for RecordingFeedback {
    fn name(&self) -> &str {
        "recording_feedback"
    }

    async fn send_feedback(&self, payload: &[u8]) -> Result<(), ContractError> {
        let record = serde_json::from_slice(payload)
            .map_err(|e| ContractError::sink_write("recording_feedback", e.to_string()))?;
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
