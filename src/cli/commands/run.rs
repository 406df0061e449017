//! Refresh loop command.

use anyhow::Result;
use pulse_aggregator::MarketOverview;
use std::path::Path;
use tracing::info;

use crate::cli::{pipeline, RunArgs};

pub async fn run(args: RunArgs, config_path: &Path) -> Result<()> {
    let config = pipeline::load(config_path)?;
    let service = pipeline::refresh_service(&config, args.simulate)?;

    // Log every published snapshot as a consumer would see it.
    let mut updates = service.publisher().subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let Some(snapshot) = updates.borrow_and_update().clone() else {
                continue;
            };
            let overview = MarketOverview::from_snapshot(&snapshot);
            info!(
                cycle = snapshot.cycle(),
                symbols = overview.symbols,
                total_volume_24h = overview.total_volume_24h,
                top_gainer_24h = ?overview.top_gainer_24h.as_ref().map(|m| m.symbol.to_string()),
                top_loser_24h = ?overview.top_loser_24h.as_ref().map(|m| m.symbol.to_string()),
                "market overview"
            );
        }
    });

    info!(
        interval_secs = config.aggregator.refresh_interval_secs,
        workers = config.aggregator.workers,
        "Starting market pulse. Press Ctrl-C to stop."
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; run until the cycle limit.
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received");
    };
    let cycles = service.run(shutdown, args.cycles).await;

    let metrics = service.metrics().snapshot();
    drop(service);
    watcher.await.ok();

    println!(
        "Stopped after {} cycle(s): {} published, {} failed",
        cycles, metrics.cycles_published, metrics.cycles_failed
    );
    Ok(())
}
