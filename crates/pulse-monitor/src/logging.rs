//! Logging setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// HTTP stack crates that are only interesting when something is wrong.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Filter for `level`, unless `RUST_LOG` is set.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = QUIET_TARGETS
            .iter()
            .fold(level.to_string(), |acc, target| format!("{acc},{target}=warn"));
        EnvFilter::new(directives)
    })
}

/// Setup logging with the given level.
///
/// Safe to call more than once; later calls are ignored.
pub fn setup_logging(level: &str, json: bool) {
    let filter = build_filter(level);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
