//! Tracing subscriber setup.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Tracing already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the configured level. A second call returns
/// `AlreadyInitialized` and leaves the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directive()))
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}
