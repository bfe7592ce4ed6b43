//! # Ledger Telemetry
//!
//! Logging and metrics for hosts embedding the token engine.
//!
//! ## Components
//!
//! - Structured logs via `tracing-subscriber` (pretty or JSON)
//! - Prometheus metrics, exported as text by [`MetricsHandle::gather`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Engine calls now log and count.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEDGER_SERVICE_NAME` | `token-ledger` | Service name in logs |
//! | `LEDGER_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` takes precedence) |
//! | `LEDGER_JSON_LOGS` | `false` | JSON log lines |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, AUTHORIZATION_FAILURES,
    INVARIANT_VIOLATIONS, OPERATIONS, PARTITIONS_REGISTERED, TOTAL_SUPPLY, TRANSFER_DURATION,
    TRANSFER_REJECTIONS,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and the global tracing subscriber.
///
/// Returns a guard that keeps the metrics handle for the lifetime of the host.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first, they cannot fail halfway
    let metrics = register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard { metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> MetricsHandle {
        self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad level".into());
        assert_eq!(err.to_string(), "Invalid configuration: bad level");
    }
}
