//! Snapshot report generation.

use pulse_core::types::{DashboardSnapshot, IndicatorSet};
use pulse_monitor::MetricsSnapshot;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::overview::{MarketOverview, Mover};

/// A snapshot with its market overview, ready for output.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub overview: MarketOverview,
    pub snapshot: Arc<DashboardSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSnapshot>,
}

impl SnapshotReport {
    pub fn new(snapshot: Arc<DashboardSnapshot>) -> Self {
        Self {
            overview: MarketOverview::from_snapshot(&snapshot),
            snapshot,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsSnapshot) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Rows ordered by 24h volume, highest first.
    pub fn rows(&self) -> Vec<&IndicatorSet> {
        let mut rows: Vec<&IndicatorSet> = self.snapshot.indicators().values().collect();
        rows.sort_by(|a, b| {
            b.volume_24h
                .partial_cmp(&a.volume_24h)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        rows
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let o = &self.overview;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════════════════════════════════\n");
        s.push_str(&format!(
            "  MARKET PULSE  cycle {}  {}\n",
            self.snapshot.cycle(),
            self.snapshot.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        s.push_str("═══════════════════════════════════════════════════════════════════════════════════════\n\n");

        s.push_str("OVERVIEW\n");
        s.push_str("───────────────────────────────────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Symbols:             {}\n", o.symbols));
        s.push_str(&format!("  24h Volume:          {:.2}\n", o.total_volume_24h));
        s.push_str(&format!("  Overbought (RSI>70): {}\n", o.overbought));
        s.push_str(&format!("  Oversold (RSI<30):   {}\n", o.oversold));
        s.push_str(&format!("  Avg Volatility:      {:.4}\n", o.average_volatility));
        s.push_str(&format!("  24h Top Gainer:      {}\n", mover(&o.top_gainer_24h)));
        s.push_str(&format!("  24h Top Loser:       {}\n", mover(&o.top_loser_24h)));
        s.push_str(&format!("  7d Top Gainer:       {}\n", mover(&o.top_gainer_7d)));
        s.push_str(&format!("  7d Top Loser:        {}\n", mover(&o.top_loser_7d)));
        s.push('\n');

        s.push_str("SYMBOLS\n");
        s.push_str("───────────────────────────────────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  {:<12} {:>14} {:>7} {:>9} {:>9} {:>8} {:>14} {:>14} {:>14}\n",
            "Symbol", "Price", "RSI", "24h %", "7d %", "Vol", "VWAP", "Support", "Resistance"
        ));
        for row in self.rows() {
            s.push_str(&format!(
                "  {:<12} {:>14.6} {:>7.2} {:>9.2} {:>9.2} {:>8.4} {:>14.6} {:>14.6} {:>14.6}\n",
                row.symbol.to_string(),
                row.price,
                row.rsi,
                row.change_24h,
                row.change_7d,
                row.volatility,
                row.vwap,
                row.support,
                row.resistance
            ));
        }
        s.push('\n');

        if !self.snapshot.skipped().is_empty() {
            s.push_str("SKIPPED\n");
            s.push_str("───────────────────────────────────────────────────────────────────────────────────────\n");
            for skipped in self.snapshot.skipped() {
                s.push_str(&format!("  {:<12} {}\n", skipped.symbol.to_string(), skipped.reason));
            }
            s.push('\n');
        }

        if let Some(m) = &self.metrics {
            s.push_str("PIPELINE\n");
            s.push_str("───────────────────────────────────────────────────────────────────────────────────────\n");
            s.push_str(&format!("  Cycles Published:    {}\n", m.cycles_published));
            s.push_str(&format!("  Cycles Failed:       {}\n", m.cycles_failed));
            s.push_str(&format!("  Last Cycle:          {} ms\n", m.last_cycle_ms));
            s.push_str(&format!("  Fetch Failures:      {}\n", m.fetch_failures));
            s.push_str(&format!("  Indicator Failures:  {}\n", m.indicator_failures));
            s.push('\n');
        }

        s.push_str("═══════════════════════════════════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn mover(m: &Option<Mover>) -> String {
    match m {
        Some(m) => format!("{} ({:+.2}%)", m.symbol, m.change_pct),
        None => "-".to_string(),
    }
}
