//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::StreamFailurePolicy;
use std::path::PathBuf;

/// Stereo Panel - headless runtime of the stereo camera control panel
#[derive(Parser, Debug)]
#[command(
    name = "stereo-panel",
    author,
    version,
    about = "Headless stereo camera control panel",
    long_about = "Drives the stereo camera control panel without a window.\n\n\
                  Loads a panel configuration, plays a scripted session of UI \n\
                  events against two mock cameras and saves captured pairs."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STEREO_PANEL_VERBOSE")]
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
        env = "STEREO_PANEL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a headless panel session
    Run(RunArgs),

    /// Validate configuration (and optionally a session script) without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to panel configuration file (TOML or JSON)
    #[arg(short, long, default_value = "panel.toml", env = "STEREO_PANEL_CONFIG")]
    pub config: PathBuf,

    /// Session script with the UI events to play
    #[arg(short, long, env = "STEREO_PANEL_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Ticks to keep running after the last scripted event
    #[arg(long, default_value = "10", env = "STEREO_PANEL_LINGER_TICKS")]
    pub linger_ticks: u64,

    /// Override the capture output directory
    #[arg(long, env = "STEREO_PANEL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the stream failure policy
    #[arg(long, value_enum)]
    pub stream_failure: Option<FailurePolicy>,

    /// Override the pause after each tick (microseconds)
    #[arg(long)]
    pub tick_interval_us: Option<u64>,

    /// Validate configuration and script, then exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STEREO_PANEL_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "panel.toml")]
    pub config: PathBuf,

    /// Session script to validate as well
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "panel.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show mock camera settings
    #[arg(long)]
    pub cameras: bool,
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

/// Stream failure policy override
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FailurePolicy {
    /// Terminate the session while the surface is open
    Escalate,
    /// Report and keep running
    Report,
}

impl From<FailurePolicy> for StreamFailurePolicy {
    fn from(policy: FailurePolicy) -> Self {
        match policy {
            FailurePolicy::Escalate => Self::Escalate,
            FailurePolicy::Report => Self::Report,
        }
    }
}
