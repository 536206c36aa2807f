//! Mock push provider
//!
//! Loopback 实现：每条被接受的消息在独立任务中等待模拟延迟后产生一个响应。
//! 响应结果由配置中的 token 规则决定。

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_channel::{unbounded, Receiver, Sender};
use contracts::{CorrelationId, Message, Outcome, ProviderConfig, ProviderResponse};
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

use crate::client::PushProvider;
use crate::error::{ProviderError, Result};

/// Mock provider
pub struct MockProvider {
    name: String,
    latency: Duration,
    max_payload_bytes: usize,
    invalid_tokens: HashSet<String>,
    failing_tokens: HashSet<String>,
    tx: Sender<ProviderResponse>,
    rx: Mutex<Option<Receiver<ProviderResponse>>>,
    accepted: AtomicU64,
}

impl MockProvider {
    /// 使用配置创建 provider
    pub fn new(config: &ProviderConfig) -> Self {
        let (tx, rx) = unbounded();
        Self {
            name: "mock_provider".to_string(),
            latency: config.latency(),
            max_payload_bytes: config.max_payload_bytes,
            invalid_tokens: config.invalid_tokens.iter().cloned().collect(),
            failing_tokens: config.failing_tokens.iter().cloned().collect(),
            tx,
            rx: Mutex::new(Some(rx)),
            accepted: AtomicU64::new(0),
        }
    }

    /// 已接受的消息数
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    fn classify(&self, token: &str) -> Outcome {
        if self.invalid_tokens.contains(token) {
            Outcome::InvalidToken(token.to_string())
        } else if self.failing_tokens.contains(token) {
            Outcome::TransientFailure("provider temporarily unavailable".to_string())
        } else {
            Outcome::Success
        }
    }

    /// 同步校验：token 非空、payload 为对象且不超过上限
    fn check(&self, message: &Message) -> Result<()> {
        if message.token.is_empty() {
            return Err(ProviderError::rejected("empty device token"));
        }

        if !(message.payload.is_object() || message.payload.is_null()) {
            return Err(ProviderError::rejected("payload must be a JSON object"));
        }

        let size = serde_json::to_vec(&message.payload)
            .map_err(|e| ProviderError::rejected(format!("payload not serializable: {e}")))?
            .len();
        if size > self.max_payload_bytes {
            return Err(ProviderError::PayloadTooLarge {
                size,
                max: self.max_payload_bytes,
            });
        }

        Ok(())
    }
}

impl PushProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "mock_provider_push", skip(self, message), fields(token = %message.token))]
    fn push(&self, message: Message) -> Result<CorrelationId> {
        self.check(&message)?;

        let handle =
            Handle::try_current().map_err(|_| ProviderError::rejected("no async runtime"))?;

        let correlation_id = CorrelationId::new();
        let outcome = self.classify(&message.token);
        let latency = self.latency;
        let tx = self.tx.clone();
        let started = Instant::now();

        handle.spawn(async move {
            tokio::time::sleep(latency).await;
            let response = ProviderResponse {
                correlation_id,
                message,
                outcome,
                elapsed: started.elapsed(),
            };
            if tx.send(response).await.is_err() {
                warn!(%correlation_id, "response stream closed, dropping response");
            }
        });

        self.accepted.fetch_add(1, Ordering::Relaxed);
        debug!(%correlation_id, "message accepted");
        Ok(correlation_id)
    }

    fn take_responses(&self) -> Option<Receiver<ProviderResponse>> {
        self.rx.lock().ok().and_then(|mut slot| slot.take())
    }
}
