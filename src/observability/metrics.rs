//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_events_total` (counter): events recorded by producers
//! - `breaker_event_rate` (gauge): smoothed events per second
//! - `breaker_open` (gauge): 1=open, 0=closed
//! - `breaker_transitions_total` (counter): state changes by kind
//! - `breaker_resets_total` (counter): re-arms after a trip

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::breaker::Transition;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_events(count: u64) {
    metrics::counter!("breaker_events_total").increment(count);
}

pub fn record_rate(rate: f64) {
    metrics::gauge!("breaker_event_rate").set(rate);
}

pub fn record_state(open: bool) {
    metrics::gauge!("breaker_open").set(if open { 1.0 } else { 0.0 });
}

pub fn record_transition(transition: Transition) {
    let kind = match transition {
        Transition::Tripped => "tripped",
        Transition::Recovered => "recovered",
        Transition::Unchanged => return,
    };
    metrics::counter!("breaker_transitions_total", "kind" => kind).increment(1);
}

pub fn record_reset() {
    metrics::counter!("breaker_resets_total").increment(1);
}
