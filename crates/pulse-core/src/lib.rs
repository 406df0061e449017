//! Core types and traits for the market pulse pipeline.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Symbol, Bar, PriceSeries, Timeframe)
//! - Indicator output and snapshot types (IndicatorSet, DashboardSnapshot)
//! - Core traits for indicators and upstream market-data sources
//! - The error taxonomy shared by every stage of the pipeline

pub mod types;
pub mod traits;
pub mod error;

pub use error::PulseError;
pub use types::*;
pub use traits::*;
