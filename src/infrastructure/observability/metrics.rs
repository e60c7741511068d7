//! Prometheus metrics definitions for rentcast
//!
//! All metrics use the `rentcast_` prefix and are read-only.

use prometheus::{
    CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the prediction service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Successful predictions by endpoint
    pub predictions_total: CounterVec,
    /// Failed predictions by error kind
    pub prediction_errors_total: CounterVec,
    /// Artifact load attempts
    pub artifact_loads_total: IntCounter,
    /// Prediction latency in seconds
    pub prediction_latency_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance with all counters and histograms registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new("rentcast_predictions_total", "Total predictions served"),
            &["endpoint"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_errors_total = CounterVec::new(
            Opts::new(
                "rentcast_prediction_errors_total",
                "Total failed predictions by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(prediction_errors_total.clone()))?;

        let artifact_loads_total = IntCounter::with_opts(Opts::new(
            "rentcast_artifact_loads_total",
            "Artifact load attempts",
        ))?;
        registry.register(Box::new(artifact_loads_total.clone()))?;

        let prediction_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "rentcast_prediction_latency_seconds",
                "Prediction latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0,
            ]),
            &["endpoint"],
        )?;
        registry.register(Box::new(prediction_latency_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            prediction_errors_total,
            artifact_loads_total,
            prediction_latency_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_prediction(&self, endpoint: &str) {
        self.predictions_total.with_label_values(&[endpoint]).inc();
    }

    /// Increment the error counter for `kind` (`schema`, `artifact`, `model`)
    pub fn inc_error(&self, kind: &str) {
        self.prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn inc_artifact_loads(&self) {
        self.artifact_loads_total.inc();
    }

    /// Observe prediction latency
    pub fn observe_latency(&self, endpoint: &str, seconds: f64) {
        self.prediction_latency_seconds
            .with_label_values(&[endpoint])
            .observe(seconds);
    }
}
