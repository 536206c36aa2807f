//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{PusherConfig, ReporterConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    pusher: PusherInfo,
    queue: QueueInfo,
    provider: ProviderInfo,
    feedback: Vec<ReporterInfo>,
    stats: Vec<ReporterInfo>,
    invalid_token: Vec<ReporterInfo>,
}

#[derive(Serialize)]
struct PusherInfo {
    app_name: String,
    graceful_shutdown_timeout_secs: u64,
    stats_interval_secs: u64,
}

#[derive(Serialize)]
struct QueueInfo {
    broker: String,
    channel_capacity: usize,
    poll_interval_ms: u64,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

#[derive(Serialize)]
struct ProviderInfo {
    latency_ms: u64,
    max_payload_bytes: usize,
    invalid_tokens: usize,
    failing_tokens: usize,
}

#[derive(Serialize)]
struct ReporterInfo {
    name: String,
    reporter_type: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn reporter_info(reporters: &[ReporterConfig], with_params: bool) -> Vec<ReporterInfo> {
    reporters
        .iter()
        .map(|r| ReporterInfo {
            name: r.name.clone(),
            reporter_type: format!("{:?}", r.reporter_type),
            params: if with_params {
                r.params.clone()
            } else {
                HashMap::new()
            },
        })
        .collect()
}

fn build_config_info(config: &PusherConfig, args: &InfoArgs) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        pusher: PusherInfo {
            app_name: config.pusher.app_name.clone(),
            graceful_shutdown_timeout_secs: config.pusher.graceful_shutdown_timeout_secs,
            stats_interval_secs: config.pusher.stats_interval_secs,
        },
        queue: QueueInfo {
            broker: format!("{:?}", config.queue.broker.broker_type),
            channel_capacity: config.queue.channel_capacity,
            poll_interval_ms: config.queue.poll_interval_ms,
            params: config.queue.broker.params.clone(),
        },
        provider: ProviderInfo {
            latency_ms: config.provider.latency_ms,
            max_payload_bytes: config.provider.max_payload_bytes,
            invalid_tokens: config.provider.invalid_tokens.len(),
            failing_tokens: config.provider.failing_tokens.len(),
        },
        feedback: reporter_info(&config.feedback, args.reporters),
        stats: reporter_info(&config.stats, args.reporters),
        invalid_token: reporter_info(&config.invalid_token, args.reporters),
    }
}

fn print_config_info(config: &PusherConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Pusher Configuration                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📨 Pusher");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ App: {}", config.pusher.app_name);
    println!(
        "   ├─ Graceful shutdown timeout: {}s",
        config.pusher.graceful_shutdown_timeout_secs
    );
    println!("   └─ Stats interval: {}s", config.pusher.stats_interval_secs);

    println!("\n📥 Queue");
    println!("   ├─ Broker: {:?}", config.queue.broker.broker_type);
    println!("   ├─ Channel capacity: {}", config.queue.channel_capacity);
    println!("   └─ Poll interval: {}ms", config.queue.poll_interval_ms);

    println!("\n🚀 Provider");
    println!("   ├─ Latency: {}ms", config.provider.latency_ms);
    println!("   ├─ Max payload: {} bytes", config.provider.max_payload_bytes);
    println!(
        "   └─ Scripted tokens: {} invalid, {} failing",
        config.provider.invalid_tokens.len(),
        config.provider.failing_tokens.len()
    );

    for (title, reporters) in [
        ("📤 Feedback", &config.feedback),
        ("📊 Stats", &config.stats),
        ("🗑  Invalid token", &config.invalid_token),
    ] {
        println!("\n{} ({})", title, reporters.len());
        for (i, reporter) in reporters.iter().enumerate() {
            let is_last = i == reporters.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} ({:?})", prefix, reporter.name, reporter.reporter_type);

            if args.reporters && !reporter.params.is_empty() {
                let child_prefix = if is_last { "   " } else { "│  " };
                let mut params: Vec<_> = reporter.params.iter().collect();
                params.sort();
                for (key, value) in params {
                    println!("   {}    {} = {}", child_prefix, key, value);
                }
            }
        }
    }

    println!();
}
