//! Prometheus metrics for the rights lifecycle.
//!
//! All metrics follow the naming convention: `br_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: registrations and decryptions by outcome, signature prompts
//! - **Gauge**: operations currently in flight
//! - **Histogram**: end-to-end operation duration

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Registration attempts by outcome (`registered`, or an error kind)
    pub static ref REGISTRATIONS: CounterVec = CounterVec::new(
        Opts::new("br_lifecycle_registrations_total", "Book registrations by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Decryption attempts by outcome (`unlocked`, or an error kind)
    pub static ref DECRYPTIONS: CounterVec = CounterVec::new(
        Opts::new("br_lifecycle_decryptions_total", "Rights decryptions by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Wallet signature prompts issued
    pub static ref SIGNATURE_PROMPTS: Counter = Counter::new(
        "br_signer_prompts_total",
        "Signature requests sent to the wallet"
    ).expect("metric creation failed");

    /// Register/decrypt operations currently in flight
    pub static ref IN_FLIGHT_OPERATIONS: Gauge = Gauge::new(
        "br_lifecycle_in_flight_operations",
        "Lifecycle operations currently in flight"
    ).expect("metric creation failed");

    /// Operation duration by operation (`register`, `decrypt`)
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "br_lifecycle_operation_duration_seconds",
            "End-to-end lifecycle operation duration"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid bucket layout")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(REGISTRATIONS.clone()),
        Box::new(DECRYPTIONS.clone()),
        Box::new(SIGNATURE_PROMPTS.clone()),
        Box::new(IN_FLIGHT_OPERATIONS.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard that observes `OPERATION_DURATION` for one operation on drop.
pub struct OperationTimer {
    operation: &'static str,
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start timing `operation`.
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        OPERATION_DURATION
            .with_label_values(&[self.operation])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing an operation. Observation happens on drop.
#[macro_export]
macro_rules! time_operation {
    ($operation:expr) => {
        $crate::metrics::OperationTimer::start($operation)
    };
}
