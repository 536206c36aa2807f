//! 推送指标收集模块
//!
//! 记录分发、响应与 sink 投递指标，并在内存中聚合响应延迟。

use std::collections::HashMap;
use std::time::Duration;

use contracts::Outcome;
use metrics::{counter, gauge, histogram};

/// 记录一次成功交给 provider 的消息
pub fn record_message_dispatched(app: &str) {
    counter!("pusher_messages_dispatched_total", "app" => app.to_string()).increment(1);
}

/// 记录 provider 同步拒绝
pub fn record_dispatch_rejected(app: &str) {
    counter!("pusher_dispatch_rejected_total", "app" => app.to_string()).increment(1);
}

/// 记录一个 provider 响应
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_response;
///
/// while let Ok(response) = responses.recv().await {
///     record_response(&response.outcome, response.elapsed);
/// }
/// ```
pub fn record_response(outcome: &Outcome, elapsed: Duration) {
    counter!("pusher_responses_total", "outcome" => outcome.label()).increment(1);
    histogram!("pusher_response_latency_ms").record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录当前在途消息数
pub fn record_pending(pending: usize) {
    gauge!("pusher_pending_messages").set(pending as f64);
}

/// 记录一次 sink 投递
pub fn record_sink_delivery(concern: &'static str, sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "pusher_sink_deliveries_total",
        "concern" => concern,
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 响应指标聚合器
///
/// 在内存中按结果类别聚合响应数与延迟，便于退出时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ResponseMetricsAggregator {
    /// 各结果类别的响应数
    pub outcome_counts: HashMap<&'static str, u64>,

    /// 同步拒绝数
    pub rejected: u64,

    /// 响应延迟统计（毫秒）
    pub latency_ms: RunningStats,
}

impl ResponseMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, outcome: &Outcome, elapsed: Duration) {
        *self.outcome_counts.entry(outcome.label()).or_insert(0) += 1;
        self.latency_ms.push(elapsed.as_secs_f64() * 1000.0);
    }

    /// 记录一次同步拒绝
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// 已收到的响应总数
    pub fn total_responses(&self) -> u64 {
        self.outcome_counts.values().sum()
    }

    /// 生成摘要报告
    pub fn summary(&self) -> ResponseSummary {
        let count = |label: &str| self.outcome_counts.get(label).copied().unwrap_or(0);
        let total = self.total_responses();
        let succeeded = count("success");

        ResponseSummary {
            total_responses: total,
            succeeded,
            invalid_tokens: count("invalid_token"),
            transient_failures: count("transient_failure"),
            rejected: self.rejected,
            success_rate: if total > 0 {
                succeeded as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_ms),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 响应摘要
#[derive(Debug, Clone, Default)]
pub struct ResponseSummary {
    pub total_responses: u64,
    pub succeeded: u64,
    pub invalid_tokens: u64,
    pub transient_failures: u64,
    pub rejected: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for ResponseSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Push Summary ===")?;
        writeln!(
            f,
            "Responses: {} ({:.2}% success)",
            self.total_responses, self.success_rate
        )?;
        writeln!(f, "Invalid tokens: {}", self.invalid_tokens)?;
        writeln!(f, "Transient failures: {}", self.transient_failures)?;
        writeln!(f, "Rejected at send: {}", self.rejected)?;
        writeln!(f, "Response latency (ms): {}", self.latency_ms)
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_by_outcome() {
        let mut aggregator = ResponseMetricsAggregator::new();
        aggregator.update(&Outcome::Success, Duration::from_millis(10));
        aggregator.update(&Outcome::Success, Duration::from_millis(30));
        aggregator.update(
            &Outcome::InvalidToken("t".to_string()),
            Duration::from_millis(20),
        );
        aggregator.record_rejected();

        let summary = aggregator.summary();
        assert_eq!(summary.total_responses, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.invalid_tokens, 1);
        assert_eq!(summary.rejected, 1);
        assert!((summary.latency_ms.mean - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = ResponseMetricsAggregator::new();
        aggregator.update(&Outcome::Success, Duration::from_millis(5));
        aggregator.update(
            &Outcome::TransientFailure("x".to_string()),
            Duration::from_millis(5),
        );

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Responses: 2 (50.00% success)"));
        assert!(output.contains("Transient failures: 1"));
    }
}
