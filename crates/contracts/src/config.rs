//! PusherConfig - Config Loader 输出
//!
//! 描述完整的 worker 配置：应用、队列、推送服务、三类上报 sink。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的 worker 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PusherConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 进程级设置
    pub pusher: PusherSettings,

    /// 队列（消息来源）配置
    #[serde(default)]
    pub queue: QueueConfig,

    /// 推送服务配置
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Feedback sink 列表
    #[serde(default)]
    pub feedback: Vec<ReporterConfig>,

    /// Stats sink 列表
    #[serde(default)]
    pub stats: Vec<ReporterConfig>,

    /// Invalid token handler 列表
    #[serde(default)]
    pub invalid_token: Vec<ReporterConfig>,
}

/// 进程级设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PusherSettings {
    /// 应用名称
    pub app_name: String,

    /// 优雅关闭等待上限（秒）
    #[serde(default = "default_graceful_shutdown_timeout_secs")]
    pub graceful_shutdown_timeout_secs: u64,

    /// 运行时指标采样间隔（秒）
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_graceful_shutdown_timeout_secs() -> u64 {
    10
}

fn default_stats_interval_secs() -> u64 {
    30
}

impl PusherSettings {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            graceful_shutdown_timeout_secs: default_graceful_shutdown_timeout_secs(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }

    pub fn graceful_shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_timeout_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

/// 队列配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 消息通道容量
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Broker 空闲轮询间隔（毫秒）
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Broker 来源
    #[serde(default)]
    pub broker: BrokerConfig,
}

fn default_channel_capacity() -> usize {
    1000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            broker: BrokerConfig::default(),
        }
    }
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Broker 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker 类型
    #[serde(default)]
    pub broker_type: BrokerType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Broker 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerType {
    /// 生成模拟消息
    #[default]
    Mock,
    /// 回放 JSON lines 文件
    JsonLines,
}

/// 推送服务配置（loopback 实现）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 模拟响应延迟（毫秒）
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// 单条 payload 上限（字节），超出时同步拒绝
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// 视为失效的 token
    #[serde(default)]
    pub invalid_tokens: Vec<String>,

    /// 总是返回临时失败的 token
    #[serde(default)]
    pub failing_tokens: Vec<String>,
}

fn default_latency_ms() -> u64 {
    10
}

fn default_max_payload_bytes() -> usize {
    4096
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            max_payload_bytes: default_max_payload_bytes(),
            invalid_tokens: Vec::new(),
            failing_tokens: Vec::new(),
        }
    }
}

impl ProviderConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// 上报 sink 配置（feedback / stats / invalid_token 共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub reporter_type: ReporterType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterType {
    /// 日志输出
    Log,
    /// 文件输出 (JSON lines)
    File,
    /// 网络输出 (UDP)
    Network,
    /// metrics 门面 (Prometheus)
    Metrics,
    /// 内存 token 存储
    Memory,
}

/// Sink 所属的上报类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterConcern {
    Feedback,
    Stats,
    InvalidToken,
}

impl ReporterConcern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feedback => "feedback",
            Self::Stats => "stats",
            Self::InvalidToken => "invalid_token",
        }
    }

    /// 该类别允许的 sink 类型
    pub fn allowed_types(&self) -> &'static [ReporterType] {
        match self {
            Self::Feedback => &[ReporterType::Log, ReporterType::File, ReporterType::Network],
            Self::Stats => &[ReporterType::Log, ReporterType::Metrics],
            Self::InvalidToken => &[ReporterType::Log, ReporterType::Memory],
        }
    }
}

impl PusherConfig {
    /// 最小可运行配置（单个 log sink）
    pub fn minimal(app_name: impl Into<String>) -> Self {
        let log = |name: &str| ReporterConfig {
            name: name.to_string(),
            reporter_type: ReporterType::Log,
            params: HashMap::new(),
        };
        Self {
            version: ConfigVersion::V1,
            pusher: PusherSettings::new(app_name),
            queue: QueueConfig::default(),
            provider: ProviderConfig::default(),
            feedback: vec![log("feedback_log")],
            stats: vec![log("stats_log")],
            invalid_token: vec![log("invalid_token_log")],
        }
    }

    /// 按类别取 sink 配置
    pub fn reporters(&self, concern: ReporterConcern) -> &[ReporterConfig] {
        match concern {
            ReporterConcern::Feedback => &self.feedback,
            ReporterConcern::Stats => &self.stats,
            ReporterConcern::InvalidToken => &self.invalid_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: PusherSettings = serde_json::from_str(r#"{"app_name":"game"}"#).unwrap();
        assert_eq!(settings.graceful_shutdown_timeout(), Duration::from_secs(10));
        assert_eq!(settings.stats_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_minimal_config() {
        let config = PusherConfig::minimal("game");
        assert_eq!(config.reporters(ReporterConcern::Feedback).len(), 1);
        assert_eq!(config.queue.channel_capacity, 1000);
        assert_eq!(config.provider.max_payload_bytes, 4096);
    }

    #[test]
    fn test_allowed_types_per_concern() {
        assert!(ReporterConcern::Stats
            .allowed_types()
            .contains(&ReporterType::Metrics));
        assert!(!ReporterConcern::Feedback
            .allowed_types()
            .contains(&ReporterType::Memory));
    }
}
