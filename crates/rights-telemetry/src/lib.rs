//! # Rights Telemetry
//!
//! Logging and metrics for the Book Rights workspace.
//!
//! ## Components
//!
//! - **Logs**: `tracing` + `tracing-subscriber` (pretty or JSON, `EnvFilter`)
//! - **Metrics**: Prometheus counters, gauge and histogram for the lifecycle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rights_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BR_SERVICE_NAME` | `book-rights` | Service name in logs |
//! | `BR_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `BR_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `BR_JSON_LOGS` | `false` | JSON log lines |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, OperationTimer, DECRYPTIONS,
    IN_FLIGHT_OPERATIONS, OPERATION_DURATION, REGISTRATIONS, SIGNATURE_PROMPTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let logging = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logging: logging,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
