//! Periodic runtime stats
//!
//! 周期性采样运行时指标并 fan-out 到所有 stats sink。
//! 第一次采样立即进行；任务句柄可随时取消。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::StatsEvent;
use dispatcher::ReporterSet;
use observability::RuntimeSampler;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// 可取消的 stats 采样任务
pub struct StatsLoop {
    handle: JoinHandle<()>,
    samples: Arc<AtomicU64>,
}

impl StatsLoop {
    /// 启动采样任务
    ///
    /// # Arguments
    /// * `interval` - 采样间隔（必须 > 0）
    pub fn spawn(
        reporters: Arc<ReporterSet>,
        sampler: Arc<RuntimeSampler>,
        interval: Duration,
    ) -> Self {
        let samples = Arc::new(AtomicU64::new(0));
        let counter = samples.clone();

        let handle = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "Stats loop started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let sample = sampler.sample();
                let delivered = reporters.report_stats(&StatsEvent::Runtime(sample)).await;
                let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(sample = n, delivered, "Runtime sample reported");
            }
        });

        Self { handle, samples }
    }

    /// 已上报的样本数
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 取消任务并等待其结束，返回已上报的样本数
    pub async fn cancel(self) -> u64 {
        self.handle.abort();
        // Cancellation is the expected outcome here
        let _ = self.handle.await;
        let samples = self.samples.load(Ordering::Relaxed);
        info!(samples, "Stats loop stopped");
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStats;

    #[tokio::test(start_paused = true)]
    async fn test_samples_immediately_then_every_interval() {
        let stats = Arc::new(RecordingStats::default());
        let reporters = Arc::new(ReporterSet::builder().stats(stats.clone()).build());

        let stats_loop = StatsLoop::spawn(
            reporters,
            Arc::new(RuntimeSampler::new()),
            Duration::from_secs(30),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(stats.runtime_samples(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stats.runtime_samples(), 3);

        assert_eq!(stats_loop.cancel().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_reporting() {
        let stats = Arc::new(RecordingStats::default());
        let reporters = Arc::new(ReporterSet::builder().stats(stats.clone()).build());
        let stats_loop = StatsLoop::spawn(
            reporters,
            Arc::new(RuntimeSampler::new()),
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        stats_loop.cancel().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stats.runtime_samples(), 1);
    }
}
