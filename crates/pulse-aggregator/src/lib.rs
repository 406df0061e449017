//! Market pulse aggregation pipeline.
//!
//! One refresh cycle selects the liquid symbol universe, fans the symbols
//! out over a worker pool that fetches history and computes indicators, and
//! publishes the result as an immutable [`pulse_core::DashboardSnapshot`].

mod aggregator;
mod overview;
mod publisher;
mod refresh;
mod report;
mod universe;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use overview::{MarketOverview, Mover, OVERBOUGHT_RSI, OVERSOLD_RSI};
pub use publisher::{SnapshotPublisher, SnapshotReceiver};
pub use refresh::RefreshService;
pub use report::SnapshotReport;
pub use universe::{select_markets, CachedUniverse, UniverseConfig, UniverseSelector};
