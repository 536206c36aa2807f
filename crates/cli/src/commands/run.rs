//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::PusherConfig;
use pusher::{Pusher, ShutdownReason, SignalListener};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::summary::print_summary;

/// Execute the `run` command
pub async fn run_pusher(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    info!(
        app = %config.pusher.app_name,
        broker = ?config.queue.broker.broker_type,
        graceful_shutdown_timeout_secs = config.pusher.graceful_shutdown_timeout_secs,
        feedback = config.feedback.len(),
        stats = config.stats.len(),
        invalid_token = config.invalid_token.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pusher = Pusher::from_config(&config)
        .await
        .context("Failed to build pusher")?;

    info!("Starting pusher...");
    let outcome = if args.timeout == 0 {
        pusher.run().await
    } else {
        let limit = Duration::from_secs(args.timeout);
        let mut signals = SignalListener::new()?;
        pusher
            .run_until(async move {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => info!(timeout_secs = args.timeout, "Run timeout reached"),
                    signal = signals.recv() => info!(?signal, "Received shutdown signal"),
                }
            })
            .await
    };
    let report = outcome.context("Pusher execution failed")?;

    print_summary(&report);

    if !report.drain.is_clean() {
        warn!(drain = ?report.drain, "Shutdown finished without a clean drain");
    }
    if let ShutdownReason::IntakeFailed(message) = &report.reason {
        return Err(CliError::intake_failed(message.clone()).into());
    }

    info!("Pusher finished");
    Ok(())
}

fn apply_overrides(config: &mut PusherConfig, args: &RunArgs) {
    if let Some(secs) = args.graceful_shutdown_timeout {
        info!(secs, "Overriding graceful shutdown timeout from CLI");
        config.pusher.graceful_shutdown_timeout_secs = secs;
    }
    if let Some(secs) = args.stats_interval {
        info!(secs, "Overriding stats interval from CLI");
        config.pusher.stats_interval_secs = secs;
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &PusherConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Pusher:");
    println!("  App: {}", config.pusher.app_name);
    println!(
        "  Graceful shutdown timeout: {}s",
        config.pusher.graceful_shutdown_timeout_secs
    );
    println!("  Stats interval: {}s", config.pusher.stats_interval_secs);

    println!("\nQueue:");
    println!("  Broker: {:?}", config.queue.broker.broker_type);
    println!("  Channel capacity: {}", config.queue.channel_capacity);

    for (section, reporters) in [
        ("Feedback", &config.feedback),
        ("Stats", &config.stats),
        ("Invalid token", &config.invalid_token),
    ] {
        println!("\n{section} ({}):", reporters.len());
        for reporter in reporters {
            println!("  - {} ({:?})", reporter.name, reporter.reporter_type);
        }
    }

    println!();
}
