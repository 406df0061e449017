//! Single-cycle snapshot command.

use anyhow::{Context, Result};
use pulse_aggregator::SnapshotReport;
use std::path::Path;
use tracing::info;

use crate::cli::{pipeline, OutputFormat, SnapshotArgs};

pub async fn run(args: SnapshotArgs, config_path: &Path) -> Result<()> {
    let config = pipeline::load(config_path)?;
    let service = pipeline::refresh_service(&config, args.simulate)?;

    let snapshot = service
        .run_cycle()
        .await
        .context("Aggregation cycle failed")?;
    let report = SnapshotReport::new(snapshot).with_metrics(service.metrics().snapshot());

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(save_path) = &args.save {
        let json = report.to_json()?;
        tokio::fs::write(save_path, json)
            .await
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Snapshot saved to {:?}", save_path);
    }

    Ok(())
}
