//! Market pulse CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pulse_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings from the file, CLI flags win.
    let logging = pulse_config::load_config_or_default(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    let level = cli
        .log_level
        .map_or(logging.level.as_str(), |level| level.as_str());
    setup_logging(level, cli.json_logs || logging.is_json());

    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, &cli.config).await,
        Commands::Snapshot(args) => cli::commands::snapshot::run(args, &cli.config).await,
        Commands::Universe(args) => cli::commands::universe::run(args, &cli.config).await,
        Commands::Analyze(args) => cli::commands::analyze::run(args, &cli.config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
        Commands::DefaultConfig => cli::commands::default_config::run().await,
    }
}
