//! Metrics collection for observability
//!
//! Prometheus metrics recorded by the actor around every ledger operation.
//!
//! # Metrics
//!
//! - `<ns>_operations_total{operation}` - Successful operations
//! - `<ns>_rejections_total{operation,kind}` - Rejected operations by error kind
//! - `<ns>_operation_duration_seconds` - Histogram of apply latencies
//! - `<ns>_events_total` - Journal records appended, including the issuance record

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Successful operations by name
    pub operations_total: IntCounterVec,

    /// Rejected operations by name and error kind
    pub rejections_total: IntCounterVec,

    /// Apply duration histogram
    pub operation_duration: Histogram,

    /// Journal records appended
    pub events_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("operations_total", "Successful ledger operations").namespace(namespace),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("rejections_total", "Rejected ledger operations").namespace(namespace),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "operation_duration_seconds",
                "Histogram of operation apply latencies",
            )
            .namespace(namespace)
            .buckets(vec![0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let events_total = IntCounter::with_opts(
            Opts::new("events_total", "Journal records appended").namespace(namespace),
        )?;
        registry.register(Box::new(events_total.clone()))?;

        Ok(Self {
            operations_total,
            rejections_total,
            operation_duration,
            events_total,
            registry,
        })
    }

    /// Record a successful operation
    pub fn record_success(&self, operation: &str, duration_seconds: f64) {
        self.operations_total.with_label_values(&[operation]).inc();
        self.operation_duration.observe(duration_seconds);
        self.events_total.inc();
    }

    /// Record a rejected operation
    pub fn record_rejection(&self, operation: &str, kind: &str, duration_seconds: f64) {
        self.rejections_total
            .with_label_values(&[operation, kind])
            .inc();
        self.operation_duration.observe(duration_seconds);
    }

    /// Render all metrics in the text exposition format
    pub fn gather_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
