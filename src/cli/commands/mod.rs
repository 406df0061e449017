//! CLI command implementations.

pub mod analyze;
pub mod default_config;
pub mod run;
pub mod snapshot;
pub mod universe;
pub mod validate;
