//! # Prometheus Metrics
//!
//! Operational metrics for the identifier service, scraped at `/metrics`
//! on the metrics port. Everything lives in a dedicated
//! [`prometheus::Registry`] with the `valyu` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metric handles for the node. Cloning shares the underlying metrics.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Identifiers created, labelled by `kind` (`user` / `data`).
    pub dids_created_total: IntCounterVec,
    /// Resolution requests served.
    pub resolutions_total: IntCounter,
    /// Resolutions that returned an error code.
    pub resolution_failures_total: IntCounter,
    /// Time to construct, persist and re-resolve a new identifier.
    pub creation_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("valyu".into()), None)?;

        let dids_created_total = IntCounterVec::new(
            Opts::new("dids_created_total", "Total number of identifiers created"),
            &["kind"],
        )?;
        registry.register(Box::new(dids_created_total.clone()))?;

        let resolutions_total =
            IntCounter::new("resolutions_total", "Total number of DID resolutions served")?;
        registry.register(Box::new(resolutions_total.clone()))?;

        let resolution_failures_total = IntCounter::new(
            "resolution_failures_total",
            "Total number of DID resolutions that returned an error",
        )?;
        registry.register(Box::new(resolution_failures_total.clone()))?;

        let creation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "creation_latency_seconds",
                "Identifier creation latency in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;
        registry.register(Box::new(creation_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            dids_created_total,
            resolutions_total,
            resolution_failures_total,
            creation_latency_seconds,
        })
    }

    /// Encode all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics`.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
