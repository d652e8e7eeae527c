//! Prometheus metrics for monitoring room-server health.
//!
//! Metrics are exported in Prometheus text format from a dedicated
//! listener (see `METRICS_BIND`).

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

/// Set the current live room count.
pub fn rooms_active(count: usize) {
    metrics::gauge!("rooms_active").set(count as f64);
}

/// Increment the rooms-created counter.
pub fn rooms_created_total() {
    metrics::counter!("rooms_created_total").increment(1);
}

/// Set the current live WebSocket connection count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment the total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Record a processed room command and whether it was accepted.
pub fn room_commands_total(command: &'static str, accepted: bool) {
    metrics::counter!("room_commands_total",
        "command" => command,
        "accepted" => if accepted { "true" } else { "false" }
    )
    .increment(1);
}
