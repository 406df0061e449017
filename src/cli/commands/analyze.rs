//! Offline analysis of a CSV series.

use anyhow::Result;
use chrono::Utc;
use pulse_aggregator::SnapshotReport;
use pulse_config::AppConfig;
use pulse_core::error::{DataError, PulseError};
use pulse_core::types::{DashboardSnapshot, Symbol, Timeframe};
use pulse_indicators::IndicatorEngine;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::{pipeline, AnalyzeArgs, OutputFormat};

pub async fn run(args: AnalyzeArgs, config_path: &Path) -> Result<()> {
    let config = pipeline::load(config_path)?;

    if !args.data.exists() {
        anyhow::bail!(
            "Data path '{}' does not exist. Provide a CSV file with --data",
            args.data.display()
        );
    }

    let report = analyze(&args, &config).await?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    Ok(())
}

/// Load the CSV series and compute its indicator set.
async fn analyze(args: &AnalyzeArgs, config: &AppConfig) -> Result<SnapshotReport, PulseError> {
    let symbol: Symbol = args.symbol.parse()?;
    let timeframe: Timeframe = args.timeframe.parse().map_err(DataError::ParseError)?;

    let series = pulse_data::load_csv(&args.data, symbol.clone(), timeframe).await?;
    info!(symbol = %symbol, bars = series.len(), "loaded series");

    let engine = IndicatorEngine::new(config.indicators.engine_config())?;
    let set = engine.compute(&series)?;

    let snapshot = DashboardSnapshot::new(0, Utc::now(), BTreeMap::from([(symbol, set)]), Vec::new());
    Ok(SnapshotReport::new(Arc::new(snapshot)))
}
