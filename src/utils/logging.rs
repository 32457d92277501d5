//! Logging utilities
//!
//! Provides simple logging initialization that:
//! - Respects RUST_LOG environment variable
//! - Allows configuration via config file
//! - Supports JSON output behind the `json-logging` feature
//!
//! # Usage
//!
//! ```rust,no_run
//! use module_bootstrap::utils::init_logging;
//!
//! // Uses RUST_LOG or defaults to "info"
//! init_logging(None).expect("a global subscriber is already installed");
//! ```

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::LoggingConfig;

/// Resolve the filter: RUST_LOG first, then the configured filter, then "info"
fn resolve_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::new("info"),
    }
}

/// Initialize logging
///
/// # Arguments
/// * `filter` - Optional log filter from config (e.g., "info", "module_bootstrap::module=debug").
///   If None, uses RUST_LOG environment variable or defaults to "info"
///
/// Fails if a global subscriber is already installed; the existing one is
/// left in place.
pub fn init_logging(filter: Option<&str>) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(resolve_filter(filter))
        .try_init()
}

/// Initialize logging with JSON output (for production/monitoring)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(resolve_filter(filter))
        .try_init()
}

/// Initialize logging from `LoggingConfig`
///
/// RUST_LOG always takes precedence.
pub fn init_logging_from_config(config: Option<&LoggingConfig>) -> Result<(), TryInitError> {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            init_json_logging(filter)
        }
        #[cfg(not(feature = "json-logging"))]
        {
            // Fall back to regular logging if json-logging feature not enabled
            init_logging(filter)
        }
    } else {
        init_logging(filter)
    }
}
