//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (request counts, latency, decisions)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `sfc_requests_total` (counter): total requests by method, status, and
//!   routing decision (forward / drop / reject / error)
//! - `sfc_request_duration_seconds` (histogram): latency distribution

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, decision: &str, start: Instant) {
    counter!(
        "sfc_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "decision" => decision.to_string(),
    )
    .increment(1);
    histogram!("sfc_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
