//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端测试：配置 -> broker -> provider -> sinks -> drain
//! - 优雅关闭超时

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Feedback, FeedbackStatus, Message, PusherConfig};
    use serde_json::json;

    #[test]
    fn test_minimal_config_survives_toml() {
        let config = PusherConfig::minimal("game");
        let toml = ConfigLoader::to_toml(&config).unwrap();
        let parsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        assert_eq!(parsed.pusher.app_name, "game");
        assert_eq!(parsed.pusher.graceful_shutdown_timeout_secs, 10);
        assert_eq!(parsed.feedback.len(), 1);
        assert_eq!(parsed.stats.len(), 1);
        assert_eq!(parsed.invalid_token.len(), 1);
    }

    #[test]
    fn test_rejected_feedback_shape() {
        let message = Message::new("tok", "game", json!({}));
        let feedback = Feedback::rejected(&message, "payload too large");
        let value = serde_json::to_value(&feedback).unwrap();

        assert_eq!(value["token"], "tok");
        assert_eq!(value["status"], "transient_failure");
        assert_eq!(value["reason"], "payload too large");
        assert!(value.get("correlation_id").is_none());
        assert_eq!(feedback.status, FeedbackStatus::TransientFailure);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use config_loader::ConfigLoader;
    use contracts::{
        BrokerType, Feedback, FeedbackStatus, PusherConfig, ReporterConfig, ReporterType,
    };
    use pusher::{DrainOutcome, Pusher, PusherError, ShutdownReason};

    fn reporter(name: &str, reporter_type: ReporterType, params: &[(&str, &str)]) -> ReporterConfig {
        ReporterConfig {
            name: name.to_string(),
            reporter_type,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn json_lines_config(messages: &Path, feedback: &Path) -> PusherConfig {
        let mut config = PusherConfig::minimal("game");
        config.queue.broker.broker_type = BrokerType::JsonLines;
        config
            .queue
            .broker
            .params
            .insert("path".to_string(), messages.display().to_string());
        config.queue.poll_interval_ms = 10;
        config.provider.latency_ms = 5;
        config.feedback = vec![reporter(
            "feedback_file",
            ReporterType::File,
            &[("path", &feedback.display().to_string())],
        )];
        config
    }

    fn read_feedback(path: &Path) -> Vec<Feedback> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// End-to-end: JSON lines broker -> MockProvider -> file feedback + token store
    ///
    /// 验证完整的数据流：
    /// 1. 两条消息，其中 tok-A 被 provider 判定为失效
    /// 2. invalid token handler 只被调用一次
    /// 3. 两条 feedback 都写入文件，drain 干净结束
    #[tokio::test]
    async fn test_e2e_invalid_token_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let messages = dir.path().join("messages.jsonl");
        let feedback = dir.path().join("feedback.jsonl");
        std::fs::write(
            &messages,
            concat!(
                r#"{"token":"tok-A","app":"game","payload":{"aps":{"alert":"a"}}}"#,
                "\n",
                r#"{"token":"tok-B","app":"game","payload":{"aps":{"alert":"b"}}}"#,
                "\n",
            ),
        )
        .unwrap();

        let mut config = json_lines_config(&messages, &feedback);
        config.provider.invalid_tokens = vec!["tok-A".to_string()];
        config.invalid_token = vec![reporter(
            "token_store",
            ReporterType::Memory,
            &[("app", "game"), ("tokens", "tok-A,tok-B")],
        )];
        ConfigLoader::validate(&config).unwrap();

        let report = Pusher::from_config(&config)
            .await
            .unwrap()
            .run_until(tokio::time::sleep(Duration::from_millis(300)))
            .await
            .unwrap();

        assert_eq!(report.reason, ShutdownReason::Requested);
        assert_eq!(report.drain, DrainOutcome::Clean);
        assert_eq!(report.dispatch.received, 2);
        assert_eq!(report.responses.succeeded, 1);
        assert_eq!(report.responses.invalid_tokens, 1);
        assert_eq!(report.invalid_token.delivered, 1);
        assert_eq!(report.feedback.delivered, 2);

        let records = read_feedback(&feedback);
        assert_eq!(records.len(), 2);
        let status_of = |token: &str| {
            records
                .iter()
                .find(|f| f.token == token)
                .map(|f| f.status)
                .unwrap()
        };
        assert_eq!(status_of("tok-A"), FeedbackStatus::InvalidToken);
        assert_eq!(status_of("tok-B"), FeedbackStatus::Success);
    }

    #[tokio::test]
    async fn test_e2e_malformed_and_rejected_messages() {
        let dir = tempfile::tempdir().unwrap();
        let messages = dir.path().join("messages.jsonl");
        let feedback = dir.path().join("feedback.jsonl");

        let mut file = std::fs::File::create(&messages).unwrap();
        writeln!(file, r#"{{"token":"ok","app":"game","payload":{{}}}}"#).unwrap();
        writeln!(file, "{{ not json").unwrap();
        writeln!(file, r#"{{"token":"","app":"game","payload":{{}}}}"#).unwrap();
        writeln!(file, r#"{{"token":"flaky","app":"game","payload":{{}}}}"#).unwrap();
        drop(file);

        let mut config = json_lines_config(&messages, &feedback);
        config.provider.failing_tokens = vec!["flaky".to_string()];

        let report = Pusher::from_config(&config)
            .await
            .unwrap()
            .run_until(tokio::time::sleep(Duration::from_millis(300)))
            .await
            .unwrap();

        assert!(report.drain.is_clean());
        // The malformed line never reaches the dispatcher
        assert_eq!(report.dispatch.received, 3);
        assert_eq!(report.dispatch.rejected, 1);
        assert_eq!(report.responses.succeeded, 1);
        assert_eq!(report.responses.transient_failures, 1);

        let records = read_feedback(&feedback);
        assert_eq!(records.len(), 3);
        let rejected = records.iter().find(|f| f.token.is_empty()).unwrap();
        assert!(rejected.correlation_id.is_none());
        assert_eq!(rejected.status, FeedbackStatus::TransientFailure);
    }

    #[tokio::test]
    async fn test_e2e_drain_times_out_on_slow_provider() {
        let mut config = PusherConfig::minimal("game");
        config.pusher.graceful_shutdown_timeout_secs = 1;
        config.provider.latency_ms = 5_000;
        config
            .queue
            .broker
            .params
            .extend([("count".to_string(), "3".to_string()), ("rate_hz".to_string(), "0".to_string())]);

        let begin = std::time::Instant::now();
        let report = Pusher::from_config(&config)
            .await
            .unwrap()
            .run_until(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(report.drain, DrainOutcome::TimedOut { remaining: 3 });
        assert_eq!(report.dispatch.dispatched, 3);
        assert_eq!(report.dispatch.responses, 0);
        // Bounded by the graceful timeout, not the provider latency
        assert!(begin.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_e2e_config_file_with_generated_messages() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[pusher]
app_name = "game"
graceful_shutdown_timeout_secs = 2

[queue.broker]
broker_type = "mock"
params = { count = "5", rate_hz = "0", tokens = "t1,t2" }

[provider]
latency_ms = 1
invalid_tokens = ["t2"]

[[feedback]]
name = "fb_log"
reporter_type = "log"

[[stats]]
name = "stats_log"
reporter_type = "log"

[[invalid_token]]
name = "tokens"
reporter_type = "memory"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        let report = Pusher::from_config(&config)
            .await
            .unwrap()
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        assert!(report.drain.is_clean());
        assert_eq!(report.dispatch.received, 5);
        // t1, t2, t1, t2, t1
        assert_eq!(report.responses.succeeded, 3);
        assert_eq!(report.responses.invalid_tokens, 2);
        assert_eq!(report.invalid_token.delivered, 2);
        assert!(report.runtime_samples >= 1);
    }

    #[tokio::test]
    async fn test_e2e_missing_message_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = json_lines_config(
            &dir.path().join("missing.jsonl"),
            &dir.path().join("feedback.jsonl"),
        );

        let result = Pusher::from_config(&config).await;
        assert!(matches!(result, Err(PusherError::Broker(_))));
    }
}
