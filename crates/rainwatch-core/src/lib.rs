pub mod config;
pub mod error;

pub use crate::config::{AlertConfig, ForecastSource, ValidationResult};
pub use crate::error::ConfigError;

/// Initialize tracing/logging.
///
/// Honours `RUST_LOG`; falls back to `info` when it is unset or malformed.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::debug!("rainwatch logging initialized");
}
