//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): dispatched requests by method, status,
//!   peer
//! - `lb_request_duration_seconds` (histogram): latency distribution
//! - `lb_peer_alive` (gauge): 1 = alive, 0 = dead, per peer

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the final outcome of one dispatched request.
pub fn record_request(method: &str, status: u16, peer: &str, start: Instant) {
    counter!(
        "lb_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "peer" => peer.to_string()
    )
    .increment(1);

    histogram!("lb_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a probe observation for one peer.
pub fn record_peer_health(peer: &str, alive: bool) {
    gauge!("lb_peer_alive", "peer" => peer.to_string()).set(if alive { 1.0 } else { 0.0 });
}
