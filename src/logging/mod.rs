// Logging module for structured logging using the tracing crate

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON formatting for easy parsing by log aggregation systems
/// - Filtering from `RUST_LOG`, falling back to `info`
/// - Output to stdout for container/cloud-native deployments
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
///
/// # Examples
///
/// ```
/// use waf_auditlog::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("Audit writer starting");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
