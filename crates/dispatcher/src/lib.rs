//! # Dispatcher
//!
//! 推送分发模块。
//!
//! 负责：
//! - 消费队列消息并交给 provider（intake loop）
//! - 处理 provider 响应并分类（response loop）
//! - Fan-out 到 feedback / stats / invalid token sinks，单个 sink 失败不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod fanout;
pub mod metrics;
pub mod sinks;

#[cfg(test)]
mod testing;

pub use contracts::{FeedbackReporter, InvalidTokenHandler, StatsReporter};
pub use dispatcher::MessageDispatcher;
pub use error::DispatcherError;
pub use factory::build_reporters;
pub use fanout::{ReporterNames, ReporterSet, ReporterSetBuilder};
pub use metrics::{DispatchSnapshot, FanoutSnapshot};
pub use sinks::{
    FileFeedbackReporter, InMemoryTokenStore, LogFeedbackReporter, LogInvalidTokenHandler,
    LogStatsReporter, NetworkFeedbackReporter, TokenStore, TokenStoreHandler,
};
