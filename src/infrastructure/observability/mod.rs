//! Pull-based observability for rentcast
//!
//! Metrics live in a private Prometheus registry and are exposed as text by the
//! HTTP adapter on `GET /metrics`. Logging goes through `tracing`.

pub mod metrics;

pub use metrics::Metrics;
