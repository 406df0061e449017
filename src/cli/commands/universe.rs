//! Universe listing command.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::{pipeline, UniverseArgs};

pub async fn run(args: UniverseArgs, config_path: &Path) -> Result<()> {
    let config = pipeline::load(config_path)?;
    let client = pipeline::client(&config, args.simulate)?;
    let selector = pipeline::selector(&config, client);

    let universe = selector
        .list_active_symbols()
        .await
        .context("Failed to select symbol universe")?;

    println!(
        "{} symbols quoted in {} with 24h volume above {:.0} (selected {})",
        universe.len(),
        config.universe.quote_asset,
        config.universe.min_quote_volume,
        universe.selected_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("  {:>4}  {:<14} {:>20} {:>16}", "#", "Symbol", "Quote Volume", "Last Price");
    for (rank, market) in universe.markets().iter().enumerate() {
        println!(
            "  {:>4}  {:<14} {:>20.0} {:>16.6}",
            rank + 1,
            market.symbol.to_string(),
            market.quote_volume,
            market.last_price
        );
    }

    Ok(())
}
