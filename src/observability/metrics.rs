//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frontend_requests_total` (counter): requests by method, status
//! - `frontend_redirects_total` (counter): redirects issued, by status
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "frontend_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_redirect(status: u16) {
    metrics::counter!("frontend_redirects_total", "status" => status.to_string()).increment(1);
}
