//! Ingestion 错误类型

use thiserror::Error;

/// Broker 拉取错误
#[derive(Debug, Error)]
pub enum BrokerError {
    /// 单条消息无法解析（可恢复，跳过该消息）
    #[error("malformed message: {message}")]
    Malformed {
        /// 错误消息
        message: String,
    },

    /// Broker 不可恢复错误（消费循环退出）
    #[error("fatal broker error: {message}")]
    Fatal {
        /// 错误消息
        message: String,
    },

    /// IO 错误（视为不可恢复）
    #[error("broker io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrokerError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// 是否可以跳过该消息继续消费
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 消费循环已在运行（每个队列只允许一个）
    #[error("consume loop already started")]
    AlreadyConsuming,

    /// 消息通道已关闭
    #[error("message channel closed")]
    ChannelClosed,

    /// Broker 不可恢复错误
    #[error("broker '{broker}' failed: {source}")]
    Broker {
        /// Broker 名称
        broker: String,
        /// 原始错误
        #[source]
        source: BrokerError,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
