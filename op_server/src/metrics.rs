//! Prometheus metrics for the registration server.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener,
//! scrape path `/metrics`.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on the given address
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

/// Record an admission decision (`outcome` is `confirmed` or `waitlist`)
pub fn registrations_total(outcome: &str) {
    metrics::counter!("registrations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a cancellation, tagged with how many players were demoted
pub fn cancellations_total(demoted: usize) {
    metrics::counter!("cancellations_total").increment(1);
    if demoted > 0 {
        metrics::counter!("rebalance_demotions_total").increment(demoted as u64);
    }
}

/// Record promoted players from a bulk promotion pass
pub fn promotions_total(reason: &str, promoted: u64) {
    metrics::counter!("promotions_total", "reason" => reason.to_string()).increment(promoted);
}

/// Record a rejected registration or organizer call
pub fn registration_errors_total(code: &str) {
    metrics::counter!("registration_errors_total", "code" => code.to_string()).increment(1);
}

/// Record an organizer ranking operation
pub fn ranking_operations_total(operation: &str) {
    metrics::counter!("ranking_operations_total", "operation" => operation.to_string())
        .increment(1);
}
