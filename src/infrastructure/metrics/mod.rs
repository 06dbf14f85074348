//! Prometheus Metrics Module
//!
//! Provides gateway-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active WebSocket connection gauge
//! - Inbound frame counts by event type and outcome
//! - Broadcast delivery counts by result
//! - Database query duration histograms

use std::time::Instant;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active WebSocket connections gauge
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("chat_gateway"),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Inbound frames by event type and how they were handled
pub static WEBSOCKET_FRAMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("websocket_frames_total", "Inbound WebSocket frames processed")
            .namespace("chat_gateway"),
        &["event", "outcome"],
    )
    .expect("Failed to create WEBSOCKET_FRAMES_TOTAL metric")
});

/// Broadcast fan-out results per recipient
pub static BROADCAST_DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "broadcast_deliveries_total",
            "Per-recipient broadcast results",
        )
        .namespace("chat_gateway"),
        &["result"], // "delivered", "offline", "failed"
    )
    .expect("Failed to create BROADCAST_DELIVERIES_TOTAL metric")
});

/// Database query duration histogram
pub static DB_QUERY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];
    HistogramVec::new(
        HistogramOpts::new(
            "db_query_duration_seconds",
            "Database query latency in seconds",
        )
        .namespace("chat_gateway")
        .buckets(buckets),
        &["operation", "table"],
    )
    .expect("Failed to create DB_QUERY_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(WEBSOCKET_FRAMES_TOTAL.clone()))
        .expect("Failed to register WEBSOCKET_FRAMES_TOTAL");
    registry
        .register(Box::new(BROADCAST_DELIVERIES_TOTAL.clone()))
        .expect("Failed to register BROADCAST_DELIVERIES_TOTAL");
    registry
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("Failed to register DB_QUERY_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Track a connection opening (`delta = 1.0`) or closing (`delta = -1.0`)
pub fn add_websocket_connections(delta: f64) {
    WEBSOCKET_CONNECTIONS_ACTIVE.add(delta);
}

/// Helper to record how an inbound frame was handled
pub fn record_frame(event: &str, outcome: &str) {
    WEBSOCKET_FRAMES_TOTAL
        .with_label_values(&[event, outcome])
        .inc();
}

/// Helper to record one broadcast's per-recipient results
pub fn record_broadcast(delivered: u64, offline: u64, failed: u64) {
    BROADCAST_DELIVERIES_TOTAL
        .with_label_values(&["delivered"])
        .inc_by(delivered);
    BROADCAST_DELIVERIES_TOTAL
        .with_label_values(&["offline"])
        .inc_by(offline);
    BROADCAST_DELIVERIES_TOTAL
        .with_label_values(&["failed"])
        .inc_by(failed);
}

/// Helper to record database query metrics
pub fn record_db_query(operation: &str, table: &str, duration_secs: f64) {
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(duration_secs);
}

/// Measures one query; call [`DbTimer::finish`] once it succeeded.
pub struct DbTimer {
    operation: &'static str,
    table: &'static str,
    started: Instant,
}

impl DbTimer {
    pub fn start(operation: &'static str, table: &'static str) -> Self {
        Self {
            operation,
            table,
            started: Instant::now(),
        }
    }

    pub fn finish(self) {
        record_db_query(
            self.operation,
            self.table,
            self.started.elapsed().as_secs_f64(),
        );
    }
}
