//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by service and status
//! - `router_request_duration_seconds` (histogram): latency distribution
//! - `router_replica_alive` (gauge): 1=alive, 0=not alive
//! - `router_probe_failures_total` (counter): failed health probes by replica
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(service: &str, status: u16, start: Instant) {
    counter!(
        "router_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("router_request_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the liveness of a replica after a probe.
pub fn record_replica_alive(service: &str, replica: &str, alive: bool) {
    gauge!(
        "router_replica_alive",
        "service" => service.to_string(),
        "replica" => replica.to_string()
    )
    .set(if alive { 1.0 } else { 0.0 });
}

/// Record a failed health probe.
pub fn record_probe_failure(service: &str, replica: &str) {
    counter!(
        "router_probe_failures_total",
        "service" => service.to_string(),
        "replica" => replica.to_string()
    )
    .increment(1);
}
