//! Recording and failing sinks shared by the unit tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{ContractError, FeedbackReporter, InvalidTokenHandler, StatsEvent, StatsReporter};

use crate::sinks::TokenStore;

pub struct RecordingFeedback {
    name: String,
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl RecordingFeedback {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<serde_json::Value> {
        self.payloads()
            .iter()
            .map(|p| serde_json::from_slice(p).unwrap())
            .collect()
    }
}

#[async_trait]
impl FeedbackReporter for RecordingFeedback {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_feedback(&self, payload: &[u8]) -> Result<(), ContractError> {
        self.payloads.lock().unwrap().push(payload.to_vec());
        Ok(())
    }
}

pub struct FailingFeedback {
    name: String,
    attempts: AtomicU64,
}

impl FailingFeedback {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackReporter for FailingFeedback {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_feedback(&self, _payload: &[u8]) -> Result<(), ContractError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ContractError::sink_write(&self.name, "simulated failure"))
    }
}

pub struct RecordingStats {
    name: String,
    events: Mutex<Vec<StatsEvent>>,
}

impl RecordingStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.kind()).collect()
    }
}

#[async_trait]
impl StatsReporter for RecordingStats {
    fn name(&self) -> &str {
        &self.name
    }

    async fn report(&self, event: &StatsEvent) -> Result<(), ContractError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingInvalidToken {
    tokens: Mutex<Vec<(String, String)>>,
}

impl RecordingInvalidToken {
    pub fn tokens(&self) -> Vec<(String, String)> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvalidTokenHandler for RecordingInvalidToken {
    fn name(&self) -> &str {
        "recording"
    }

    async fn handle_invalid_token(&self, app: &str, token: &str) -> Result<(), ContractError> {
        self.tokens
            .lock()
            .unwrap()
            .push((app.to_string(), token.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FailingStore {
    calls: AtomicU64,
}

impl FailingStore {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for FailingStore {
    fn name(&self) -> &str {
        "failing_store"
    }

    async fn delete_token(&self, _app: &str, _token: &str) -> Result<u64, ContractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ContractError::token_store("failing_store", "connection refused"))
    }
}
