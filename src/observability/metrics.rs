//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nginx_scan_files_total` (counter): files classified by a scan, by outcome
//! - `nginx_sites_generated_total` (counter): generated files, by destination
//! - `nginx_generation_failures_total` (counter): rejected generations, by kind
//! - `nginx_registered_sites` (gauge): records in the site registry

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// `outcome` is one of `new`, `duplicate`, `error`.
pub fn record_scan_file(outcome: &'static str) {
    counter!("nginx_scan_files_total", "outcome" => outcome).increment(1);
}

pub fn record_generation(destination: &'static str) {
    counter!("nginx_sites_generated_total", "destination" => destination).increment(1);
}

pub fn record_generation_failure(kind: &'static str) {
    counter!("nginx_generation_failures_total", "kind" => kind).increment(1);
}

pub fn record_registered_sites(count: usize) {
    gauge!("nginx_registered_sites").set(count as f64);
}
