//! 配置校验模块
//!
//! 校验规则：
//! - app_name 非空
//! - 超时与采样间隔 > 0
//! - 队列容量与轮询间隔 > 0
//! - broker / sink 必填参数齐全
//! - 同一类别内 sink 名称唯一，且类型被该类别支持

use std::collections::HashSet;

use contracts::{
    BrokerType, ContractError, PusherConfig, ReporterConcern, ReporterConfig, ReporterType,
};

/// 校验 PusherConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &PusherConfig) -> Result<(), ContractError> {
    validate_settings(config)?;
    validate_queue(config)?;
    for concern in [
        ReporterConcern::Feedback,
        ReporterConcern::Stats,
        ReporterConcern::InvalidToken,
    ] {
        validate_reporters(concern, config.reporters(concern))?;
    }
    Ok(())
}

/// 校验进程级设置
fn validate_settings(config: &PusherConfig) -> Result<(), ContractError> {
    let settings = &config.pusher;

    if settings.app_name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "pusher.app_name",
            "app_name cannot be empty",
        ));
    }

    if settings.graceful_shutdown_timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "pusher.graceful_shutdown_timeout_secs",
            "graceful_shutdown_timeout_secs must be > 0",
        ));
    }

    if settings.stats_interval_secs == 0 {
        return Err(ContractError::config_validation(
            "pusher.stats_interval_secs",
            "stats_interval_secs must be > 0",
        ));
    }

    Ok(())
}

/// 校验队列配置
fn validate_queue(config: &PusherConfig) -> Result<(), ContractError> {
    let queue = &config.queue;

    if queue.channel_capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.channel_capacity",
            "channel_capacity must be > 0",
        ));
    }

    if queue.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "queue.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }

    if queue.broker.broker_type == BrokerType::JsonLines
        && !queue.broker.params.contains_key("path")
    {
        return Err(ContractError::config_validation(
            "queue.broker.params.path",
            "json_lines broker requires a 'path' parameter",
        ));
    }

    Ok(())
}

/// 校验某一类别的 sink 配置
fn validate_reporters(
    concern: ReporterConcern,
    reporters: &[ReporterConfig],
) -> Result<(), ContractError> {
    let section = concern.as_str();
    let mut seen = HashSet::new();

    for (idx, reporter) in reporters.iter().enumerate() {
        if reporter.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("{section}[{idx}].name"),
                "reporter name cannot be empty",
            ));
        }

        if !seen.insert(reporter.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("{section}[name={}]", reporter.name),
                "duplicate reporter name",
            ));
        }

        if !concern.allowed_types().contains(&reporter.reporter_type) {
            return Err(ContractError::config_validation(
                format!("{section}[{}].reporter_type", reporter.name),
                format!(
                    "{:?} reporter is not supported for {section}",
                    reporter.reporter_type
                ),
            ));
        }

        let required = match reporter.reporter_type {
            ReporterType::File => Some("path"),
            ReporterType::Network => Some("addr"),
            _ => None,
        };
        if let Some(param) = required {
            if !reporter.params.contains_key(param) {
                return Err(ContractError::config_validation(
                    format!("{section}[{}].params.{param}", reporter.name),
                    format!("missing required parameter '{param}'"),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reporter(name: &str, reporter_type: ReporterType) -> ReporterConfig {
        ReporterConfig {
            name: name.to_string(),
            reporter_type,
            params: HashMap::new(),
        }
    }

    #[test]
    fn test_minimal_config_is_valid() {
        let config = PusherConfig::minimal("game");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_app_name() {
        let mut config = PusherConfig::minimal("game");
        config.pusher.app_name = "  ".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("app_name"));
    }

    #[test]
    fn test_zero_shutdown_timeout() {
        let mut config = PusherConfig::minimal("game");
        config.pusher.graceful_shutdown_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_json_lines_requires_path() {
        let mut config = PusherConfig::minimal("game");
        config.queue.broker.broker_type = BrokerType::JsonLines;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_duplicate_reporter_names() {
        let mut config = PusherConfig::minimal("game");
        config.feedback = vec![
            reporter("dup", ReporterType::Log),
            reporter("dup", ReporterType::Log),
        ];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_same_name_across_concerns_is_allowed() {
        let mut config = PusherConfig::minimal("game");
        config.feedback = vec![reporter("log", ReporterType::Log)];
        config.stats = vec![reporter("log", ReporterType::Log)];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_reporter_type_not_allowed_for_concern() {
        let mut config = PusherConfig::minimal("game");
        config.stats = vec![reporter("store", ReporterType::Memory)];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_file_reporter_requires_path() {
        let mut config = PusherConfig::minimal("game");
        config.feedback = vec![reporter("file", ReporterType::File)];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("'path'"));
    }
}
