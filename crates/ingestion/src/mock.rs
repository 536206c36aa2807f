//! Mock broker
//!
//! 用于无真实 broker 环境的测试与本地运行。
//! 支持两种模式：按速率生成消息，或按脚本回放（可注入错误）。

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use contracts::Message;
use serde_json::json;
use tracing::{debug, trace};

use crate::broker::BrokerSource;
use crate::error::BrokerError;

/// Mock broker 配置
#[derive(Debug, Clone)]
pub struct MockBrokerConfig {
    /// Broker 名称
    pub name: String,

    /// 生成消息的应用名
    pub app: String,

    /// 轮流使用的目标 token
    pub tokens: Vec<String>,

    /// 生成消息总数（None = 无限）
    pub count: Option<u64>,

    /// 生成速率 (Hz)，0 表示不限速
    pub rate_hz: f64,

    /// 无消息时的轮询间隔
    pub poll_interval: Duration,
}

impl Default for MockBrokerConfig {
    fn default() -> Self {
        Self {
            name: "mock_broker".to_string(),
            app: "mock_app".to_string(),
            tokens: vec!["mock-token".to_string()],
            count: Some(100),
            rate_hz: 100.0,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl MockBrokerConfig {
    /// 从参数表创建配置
    ///
    /// 支持参数：`count`（0 = 无限）、`rate_hz`、`tokens`（逗号分隔）、`app`
    pub fn from_params(
        name: impl Into<String>,
        default_app: &str,
        params: &HashMap<String, String>,
        poll_interval: Duration,
    ) -> Result<Self, String> {
        let count = match params.get("count") {
            Some(s) => match s.parse::<u64>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(e) => return Err(format!("invalid count '{s}': {e}")),
            },
            None => Some(100),
        };

        let rate_hz = match params.get("rate_hz") {
            Some(s) => s
                .parse::<f64>()
                .map_err(|e| format!("invalid rate_hz '{s}': {e}"))?,
            None => 100.0,
        };
        if rate_hz < 0.0 {
            return Err(format!("rate_hz must be >= 0, got {rate_hz}"));
        }

        let tokens: Vec<String> = params
            .get("tokens")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec!["mock-token".to_string()]);
        if tokens.is_empty() {
            return Err("tokens must not be empty".to_string());
        }

        Ok(Self {
            name: name.into(),
            app: params
                .get("app")
                .cloned()
                .unwrap_or_else(|| default_app.to_string()),
            tokens,
            count,
            rate_hz,
            poll_interval,
        })
    }
}

/// Mock broker
///
/// 先回放脚本条目，再按配置生成消息；全部耗尽后可返回一次注入的致命错误，
/// 之后进入空闲轮询。
pub struct MockBroker {
    config: MockBrokerConfig,
    script: VecDeque<Result<Message, BrokerError>>,
    generated: u64,
    failure: Option<BrokerError>,
}

impl MockBroker {
    /// 创建按速率生成消息的 broker
    pub fn new(config: MockBrokerConfig) -> Self {
        Self {
            config,
            script: VecDeque::new(),
            generated: 0,
            failure: None,
        }
    }

    /// 只回放给定消息
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self::scripted(messages.into_iter().map(Ok).collect())
    }

    /// 回放脚本（可包含错误）
    pub fn scripted(entries: Vec<Result<Message, BrokerError>>) -> Self {
        let config = MockBrokerConfig {
            count: Some(0),
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        };
        Self {
            config,
            script: entries.into(),
            generated: 0,
            failure: None,
        }
    }

    /// 消息耗尽后返回一次 `error`
    pub fn then_fail(mut self, error: BrokerError) -> Self {
        self.failure = Some(error);
        self
    }

    /// 已生成的消息数
    pub fn generated(&self) -> u64 {
        self.generated
    }

    fn exhausted(&self) -> bool {
        self.config.tokens.is_empty()
            || self
                .config
                .count
                .is_some_and(|count| self.generated >= count)
    }

    fn next_generated(&mut self) -> Message {
        let idx = (self.generated % self.config.tokens.len() as u64) as usize;
        let message = Message::new(
            self.config.tokens[idx].clone(),
            self.config.app.clone(),
            json!({
                "aps": { "alert": format!("mock notification {}", self.generated) }
            }),
        );
        self.generated += 1;
        message
    }
}

impl BrokerSource for MockBroker {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn poll(&mut self) -> Result<Option<Message>, BrokerError> {
        if let Some(entry) = self.script.pop_front() {
            trace!(broker = %self.config.name, "replaying scripted entry");
            return entry.map(Some);
        }

        if !self.exhausted() {
            if self.config.rate_hz > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(1.0 / self.config.rate_hz)).await;
            }
            return Ok(Some(self.next_generated()));
        }

        if let Some(error) = self.failure.take() {
            debug!(broker = %self.config.name, error = %error, "injecting broker failure");
            return Err(error);
        }

        tokio::time::sleep(self.config.poll_interval).await;
        Ok(None)
    }
}
