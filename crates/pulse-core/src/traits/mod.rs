//! Core traits for the market pulse pipeline.

mod data_source;
mod indicator;

pub use data_source::MarketDataSource;
pub use indicator::Indicator;
