//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::PusherConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    app_name: String,
    broker: String,
    feedback_count: usize,
    stats_count: usize,
    invalid_token_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    app_name: config.pusher.app_name.clone(),
                    broker: format!("{:?}", config.queue.broker.broker_type),
                    feedback_count: config.feedback.len(),
                    stats_count: config.stats.len(),
                    invalid_token_count: config.invalid_token.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &PusherConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.feedback.is_empty() {
        warnings.push("No feedback reporters configured - delivery outcomes will be dropped".to_string());
    }
    if config.stats.is_empty() {
        warnings.push("No stats reporters configured".to_string());
    }
    if config.invalid_token.is_empty() {
        warnings.push(
            "No invalid token handlers configured - invalid tokens will not be removed".to_string(),
        );
    }

    for token in &config.provider.invalid_tokens {
        if config.provider.failing_tokens.contains(token) {
            warnings.push(format!(
                "Token '{token}' is listed as both invalid and failing; invalid wins"
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  App: {}", summary.app_name);
            println!("  Broker: {}", summary.broker);
            println!("  Feedback reporters: {}", summary.feedback_count);
            println!("  Stats reporters: {}", summary.stats_count);
            println!("  Invalid token handlers: {}", summary.invalid_token_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
