//! # Pusher
//!
//! 推送 worker 的进程组装与生命周期管理。
//!
//! 负责：
//! - 按配置组装 queue / provider / dispatcher / sinks
//! - 启动 consume、intake、response、stats 四个后台任务
//! - 响应 SIGINT / SIGTERM，执行有界的优雅关闭（drain）
//!
//! # Example
//!
//! ```no_run
//! use contracts::PusherConfig;
//! use pusher::Pusher;
//!
//! # async fn example() -> pusher::Result<()> {
//! let config = PusherConfig::minimal("game");
//! let report = Pusher::from_config(&config).await?.run().await?;
//! println!("drain: {:?}", report.drain);
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod pusher;
pub mod signal;
pub mod stats_loop;

#[cfg(test)]
mod testing;

pub use coordinator::{DrainOutcome, ShutdownCoordinator, ShutdownState};
pub use error::{PusherError, Result};
pub use pusher::{Pusher, PusherReport, RunningPusher, ShutdownReason};
pub use signal::{ShutdownSignal, SignalListener};
pub use stats_loop::StatsLoop;
