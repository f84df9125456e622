//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define bridge metrics (events, fires, suppressions, sends, errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `bridge_events_total` (counter): events received from the bus
//! - `bridge_fires_total` (counter): fires by trigger
//! - `bridge_debounced_total` (counter): debounce suppressions by trigger
//! - `bridge_datagrams_sent_total` (counter): datagrams sent
//! - `bridge_send_errors_total` (counter): failed sends
//! - `bridge_speed_measurements_total` (counter): completed speed pairs
//! - `bridge_notifications_total` (counter): engine notifications by kind
//! - `bridge_mappings` (gauge): size of the live mapping table
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels limited to trigger names (bounded by the mapping table)

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_event() {
    counter!("bridge_events_total").increment(1);
}

pub fn record_fire(trigger: &str) {
    counter!("bridge_fires_total", "trigger" => trigger.to_string()).increment(1);
}

pub fn record_debounced(trigger: &str) {
    counter!("bridge_debounced_total", "trigger" => trigger.to_string()).increment(1);
}

pub fn record_send(success: bool) {
    if success {
        counter!("bridge_datagrams_sent_total").increment(1);
    } else {
        counter!("bridge_send_errors_total").increment(1);
    }
}

pub fn record_speed_measurement() {
    counter!("bridge_speed_measurements_total").increment(1);
}

pub fn record_notification(kind: &'static str) {
    counter!("bridge_notifications_total", "kind" => kind).increment(1);
}

pub fn record_mapping_count(count: usize) {
    gauge!("bridge_mappings").set(count as f64);
}
