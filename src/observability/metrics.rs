//! Metrics collection and exposition.
//!
//! # Metrics
//! - `link_proxy_requests_total` (counter): download requests by mode and status
//! - `link_proxy_request_duration_seconds` (histogram): time to response headers
//! - `link_proxy_resolve_total` (counter): resolver outcomes by code
//! - `link_proxy_fallback_total` (counter): proxy fetches recovered by redirect
//! - `link_proxy_sms_total` (counter): SMS relay calls by upstream status
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op, so tests need no setup

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished download request.
pub fn record_request(delivery: &'static str, status: u16, start: Instant) {
    counter!(
        "link_proxy_requests_total",
        "mode" => delivery,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("link_proxy_request_duration_seconds", "mode" => delivery)
        .record(start.elapsed().as_secs_f64());
}

/// Record a resolver outcome (`ok` or a failure code).
pub fn record_resolve(outcome: &'static str) {
    counter!("link_proxy_resolve_total", "outcome" => outcome).increment(1);
}

/// Record a proxy fetch recovered by the fallback redirect.
pub fn record_fallback() {
    counter!("link_proxy_fallback_total").increment(1);
}

/// Record a relayed SMS call.
pub fn record_sms(status: u16) {
    counter!("link_proxy_sms_total", "status" => status.to_string()).increment(1);
}
