//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fleet_commands_published_total` (counter): commands by kind, outcome
//! - `fleet_events_consumed_total` (counter): inbound events dispatched, by kind
//! - `fleet_events_dropped_total` (counter): inbound payloads dropped, by reason
//! - `fleet_replica_transitions_total` (counter): status writes, by target status
//! - `fleet_statistics_records_total` (counter): statistics records accumulated
//! - `fleet_bridge_sessions` (gauge): connected proxy WebSocket sessions

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_command_published(kind: &'static str, ok: bool) {
    let outcome = if ok { "published" } else { "failed" };
    counter!("fleet_commands_published_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_event_consumed(kind: &'static str) {
    counter!("fleet_events_consumed_total", "kind" => kind).increment(1);
}

pub fn record_event_dropped(reason: &'static str) {
    counter!("fleet_events_dropped_total", "reason" => reason).increment(1);
}

pub fn record_replica_transition(to: &'static str) {
    counter!("fleet_replica_transitions_total", "to" => to).increment(1);
}

pub fn record_statistics_records(count: usize) {
    counter!("fleet_statistics_records_total").increment(count as u64);
}

pub fn record_bridge_sessions(delta: f64) {
    gauge!("fleet_bridge_sessions").increment(delta);
}
