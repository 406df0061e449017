//! Logging and pipeline metrics.

mod logging;
mod metrics;

pub use logging::{build_filter, setup_logging};
pub use metrics::{CycleMetrics, MetricsSnapshot};
