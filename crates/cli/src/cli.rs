//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pusher - push notification dispatch worker
#[derive(Parser, Debug)]
#[command(
    name = "pusher",
    author,
    version,
    about = "Push notification dispatch worker",
    long_about = "Consumes push messages from a broker, hands them to a push provider \n\
                  and fans delivery outcomes out to feedback, stats and invalid-token sinks.\n\n\
                  On SIGINT/SIGTERM intake stops and in-flight sends are drained \n\
                  within the graceful shutdown timeout."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PUSHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PUSHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the push worker until SIGINT/SIGTERM
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "pusher.toml", env = "PUSHER_CONFIG")]
    pub config: PathBuf,

    /// Override pusher.graceful_shutdown_timeout_secs
    #[arg(long, env = "PUSHER_GRACEFUL_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: Option<u64>,

    /// Override pusher.stats_interval_secs
    #[arg(long, env = "PUSHER_STATS_INTERVAL")]
    pub stats_interval: Option<u64>,

    /// Shut down after this many seconds (0 = run until signalled)
    #[arg(long, default_value = "0", env = "PUSHER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "PUSHER_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pusher.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pusher.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show reporter parameters
    #[arg(long)]
    pub reporters: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "pusher",
            "-v",
            "run",
            "--config",
            "custom.toml",
            "--graceful-shutdown-timeout",
            "3",
            "--metrics-port",
            "9100",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("custom.toml"));
                assert_eq!(args.graceful_shutdown_timeout, Some(3));
                assert_eq!(args.metrics_port(), Some(9100));
                assert!(!args.dry_run);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        let cli = Cli::try_parse_from(["pusher", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.metrics_port(), None);
                assert_eq!(args.config, PathBuf::from("pusher.toml"));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pusher", "-q", "-v", "validate"]).is_err());
    }
}
