//! Prometheus metrics for the token ledger.
//!
//! All metrics follow the naming convention: `ledger_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., operations_total)
//! - **Gauge**: Value that can go up or down (e.g., total_supply)
//! - **Histogram**: Distribution of values (e.g., transfer_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OPERATION METRICS
    // =========================================================================

    /// Successful operations by kind
    pub static ref OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("ledger_operations_total", "Successful ledger operations"),
        &["operation"]  // issue/redeem/transfer/operator_transfer/repartition
    ).expect("metric creation failed");

    /// Rejected transfers by status code label
    pub static ref TRANSFER_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("ledger_transfer_rejections_total", "Transfers rejected by validation"),
        &["status"]
    ).expect("metric creation failed");

    /// Authorization failures by operation
    pub static ref AUTHORIZATION_FAILURES: CounterVec = CounterVec::new(
        Opts::new("ledger_authorization_failures_total", "Calls rejected for missing roles"),
        &["operation"]
    ).expect("metric creation failed");

    /// Time spent applying a transfer, hooks included
    pub static ref TRANSFER_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ledger_transfer_duration_seconds",
            "Time spent validating and applying transfers"
        ).buckets(exponential_buckets(0.000_01, 2.0, 15).expect("bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // SUPPLY METRICS
    // =========================================================================

    /// Current total supply across partitions
    pub static ref TOTAL_SUPPLY: Gauge = Gauge::new(
        "ledger_total_supply",
        "Sum of all balances across partitions"
    ).expect("metric creation failed");

    /// Registered partitions
    pub static ref PARTITIONS_REGISTERED: Gauge = Gauge::new(
        "ledger_partitions_registered",
        "Number of registered partitions"
    ).expect("metric creation failed");

    /// Invariant violations (for alerting)
    pub static ref INVARIANT_VIOLATIONS: Counter = Counter::new(
        "ledger_invariant_violations_total",
        "Supply invariant violations that halted a partition"
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

impl MetricsHandle {
    /// Encode all metrics as Prometheus text format.
    pub fn gather(&self) -> Result<String, TelemetryError> {
        encode_metrics()
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OPERATIONS.clone()),
        Box::new(TRANSFER_REJECTIONS.clone()),
        Box::new(AUTHORIZATION_FAILURES.clone()),
        Box::new(TRANSFER_DURATION.clone()),
        Box::new(TOTAL_SUPPLY.clone()),
        Box::new(PARTITIONS_REGISTERED.clone()),
        Box::new(INVARIANT_VIOLATIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
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

pub fn record_operation(operation: &str) {
    OPERATIONS.with_label_values(&[operation]).inc();
}

pub fn record_rejection(status: &str) {
    TRANSFER_REJECTIONS.with_label_values(&[status]).inc();
}

pub fn record_authorization_failure(operation: &str) {
    AUTHORIZATION_FAILURES.with_label_values(&[operation]).inc();
}

pub fn record_invariant_violation() {
    INVARIANT_VIOLATIONS.inc();
}

/// Gauges are `f64`; very large supplies lose precision, which is acceptable
/// for dashboards.
pub fn set_total_supply(supply: u128) {
    TOTAL_SUPPLY.set(supply as f64);
}

pub fn set_partition_count(count: usize) {
    PARTITIONS_REGISTERED.set(count as f64);
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
