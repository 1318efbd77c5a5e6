//! Metrics collection and exposition.
//!
//! # Metrics
//! - `multiplexer_backend_status` (gauge): 0=unavailable, 1=syncing, 2=synced
//! - `multiplexer_backend_block_number` (gauge): last observed height
//! - `multiplexer_refresh_total` (counter) / `multiplexer_refresh_duration_seconds` (histogram)
//! - `multiplexer_forwards_total` (counter): by backend, role (primary/secondary), outcome
//! - `multiplexer_no_backend_total` (counter): requests rejected for lack of a backend
//! - `multiplexer_request_duration_seconds` (histogram): inbound latency by method
//!
//! Recording is a no-op until a recorder is installed by `init_metrics`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::state::SyncSnapshot;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_backend_status(backend: &str, snapshot: SyncSnapshot) {
    gauge!("multiplexer_backend_status", "backend" => backend.to_string())
        .set(snapshot.state as u8 as f64);
    gauge!("multiplexer_backend_block_number", "backend" => backend.to_string())
        .set(snapshot.latest_block as f64);
}

pub fn record_refresh(started: Instant) {
    counter!("multiplexer_refresh_total").increment(1);
    histogram!("multiplexer_refresh_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_forward(backend: &str, role: &'static str, outcome: &'static str) {
    counter!(
        "multiplexer_forwards_total",
        "backend" => backend.to_string(),
        "role" => role,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_no_backend() {
    counter!("multiplexer_no_backend_total").increment(1);
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    histogram!(
        "multiplexer_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}
