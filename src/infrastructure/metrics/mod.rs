//! Prometheus Metrics Module
//!
//! Client-side metrics for the live leaderboard connection.
//!
//! # Metrics Collected
//! - Connection state gauge (1 while open)
//! - Reconnect attempts scheduled
//! - Inbound messages by type and malformed frames dropped
//! - Outbound request frames by type

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// 1 while the live connection is open, 0 otherwise
pub static WS_CONNECTION_OPEN: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("ws_connection_open", "Whether the live connection is open")
            .namespace("quiz_live_client"),
    )
    .expect("Failed to create WS_CONNECTION_OPEN metric")
});

/// Reconnect attempts scheduled after abnormal closes
pub static WS_RECONNECT_ATTEMPTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "ws_reconnect_attempts_total",
            "Total number of reconnect attempts scheduled",
        )
        .namespace("quiz_live_client"),
    )
    .expect("Failed to create WS_RECONNECT_ATTEMPTS_TOTAL metric")
});

/// Inbound messages by type
pub static WS_MESSAGES_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ws_messages_received_total",
            "Total number of inbound live messages",
        )
        .namespace("quiz_live_client"),
        &["type"],
    )
    .expect("Failed to create WS_MESSAGES_RECEIVED_TOTAL metric")
});

/// Inbound frames that failed to decode
pub static WS_MALFORMED_FRAMES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "ws_malformed_frames_total",
            "Total number of inbound frames dropped as malformed",
        )
        .namespace("quiz_live_client"),
    )
    .expect("Failed to create WS_MALFORMED_FRAMES_TOTAL metric")
});

/// Outbound request frames by type
pub static WS_FRAMES_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ws_frames_sent_total", "Total number of request frames sent")
            .namespace("quiz_live_client"),
        &["type"],
    )
    .expect("Failed to create WS_FRAMES_SENT_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WS_CONNECTION_OPEN.clone()))
        .expect("Failed to register WS_CONNECTION_OPEN");
    registry
        .register(Box::new(WS_RECONNECT_ATTEMPTS_TOTAL.clone()))
        .expect("Failed to register WS_RECONNECT_ATTEMPTS_TOTAL");
    registry
        .register(Box::new(WS_MESSAGES_RECEIVED_TOTAL.clone()))
        .expect("Failed to register WS_MESSAGES_RECEIVED_TOTAL");
    registry
        .register(Box::new(WS_MALFORMED_FRAMES_TOTAL.clone()))
        .expect("Failed to register WS_MALFORMED_FRAMES_TOTAL");
    registry
        .register(Box::new(WS_FRAMES_SENT_TOTAL.clone()))
        .expect("Failed to register WS_FRAMES_SENT_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record the connection being opened or closed
pub fn set_connection_open(open: bool) {
    WS_CONNECTION_OPEN.set(i64::from(open));
}

/// Record a scheduled reconnect attempt
pub fn record_reconnect_attempt() {
    WS_RECONNECT_ATTEMPTS_TOTAL.inc();
}

/// Record an inbound message by type
pub fn record_message_received(message_type: &str) {
    WS_MESSAGES_RECEIVED_TOTAL
        .with_label_values(&[message_type])
        .inc();
}

/// Record a dropped malformed frame
pub fn record_malformed_frame() {
    WS_MALFORMED_FRAMES_TOTAL.inc();
}

/// Record an outbound request frame
pub fn record_frame_sent(request_type: &str) {
    WS_FRAMES_SENT_TOTAL.with_label_values(&[request_type]).inc();
}
