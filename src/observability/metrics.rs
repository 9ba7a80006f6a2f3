//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): handled requests by status
//! - `bridge_request_duration_seconds` (histogram): adapter latency
//! - `bridge_api_errors_total` (counter): typed errors by status
//! - `bridge_unhandled_errors_total` (counter): errors that aborted a connection
//! - `bridge_pending_events` (gauge): staged events not yet consumed
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing when the exporter is disabled.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("bridge_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("bridge_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_api_error(status: u16) {
    metrics::counter!("bridge_api_errors_total", "status" => status.to_string()).increment(1);
}

pub fn record_unhandled_error() {
    metrics::counter!("bridge_unhandled_errors_total").increment(1);
}

pub fn record_pending_events(count: usize) {
    metrics::gauge!("bridge_pending_events").set(count as f64);
}
