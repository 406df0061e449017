//! CLI definitions.

pub mod commands;
pub mod pipeline;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(author, version, about = "Concurrent crypto market indicator aggregation")]
pub struct Cli {
    /// Configuration file path (defaults apply if it does not exist)
    #[arg(short, long, default_value = "config/default.toml", env = "PULSE_CONFIG")]
    pub config: PathBuf,

    /// Log level (overrides the configured one)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the refresh loop until Ctrl-C
    Run(RunArgs),
    /// Run a single cycle and print the snapshot
    Snapshot(SnapshotArgs),
    /// Print the selected symbol universe
    Universe(UniverseArgs),
    /// Compute indicators for an offline CSV series
    Analyze(AnalyzeArgs),
    /// Validate configuration
    ValidateConfig,
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Use the built-in simulated exchange instead of Binance
    #[arg(long)]
    pub simulate: bool,

    /// Stop after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,
}

#[derive(clap::Args)]
pub struct SnapshotArgs {
    /// Use the built-in simulated exchange instead of Binance
    #[arg(long)]
    pub simulate: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct UniverseArgs {
    /// Use the built-in simulated exchange instead of Binance
    #[arg(long)]
    pub simulate: bool,
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Data file (CSV)
    #[arg(long)]
    pub data: PathBuf,

    /// Symbol the data belongs to, e.g. BTC/USDT
    #[arg(short, long)]
    pub symbol: String,

    /// Bar interval of the data
    #[arg(short, long, default_value = "4h")]
    pub timeframe: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}
