//! Prometheus metrics for relay traffic and upstream health.
//!
//! This module provides:
//! - Relay request counters (per relay)
//! - Upstream error counters (per upstream and failure kind)
//! - Upstream call latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::relay::{RelayFlag, Upstream};

// === Metric Name Constants ===

/// Relay requests counter metric name.
pub const METRIC_RELAY_REQUESTS: &str = "relay_requests_total";
/// Upstream errors counter metric name.
pub const METRIC_UPSTREAM_ERRORS: &str = "upstream_errors_total";
/// Upstream latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_latency_ms";

/// Install the Prometheus recorder and register metric descriptions.
///
/// Call this once at startup; the handle renders the `/metrics` page.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        METRIC_RELAY_REQUESTS,
        "Total number of relay requests by relay"
    );
    describe_counter!(
        METRIC_UPSTREAM_ERRORS,
        "Total number of failed upstream calls by upstream and kind"
    );
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream call latency in milliseconds"
    );

    debug!("Metrics initialized");
    Ok(handle)
}

fn relay_label(flag: RelayFlag) -> &'static str {
    match flag {
        RelayFlag::SendReview => "notifier",
        RelayFlag::Catalog => "catalog",
    }
}

/// Increment the relay request counter.
pub fn inc_relay_requests(flag: RelayFlag) {
    counter!(METRIC_RELAY_REQUESTS, "relay" => relay_label(flag)).increment(1);
}

/// Increment the upstream error counter.
pub fn inc_upstream_errors(upstream: Upstream, kind: &'static str) {
    counter!(
        METRIC_UPSTREAM_ERRORS,
        "upstream" => upstream.as_ref().to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record upstream call latency.
pub fn record_upstream_latency(start: Instant, upstream: Upstream) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_UPSTREAM_LATENCY, "upstream" => upstream.as_ref().to_string())
        .record(latency_ms);
}
