use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::sync::LazyLock;

pub static TOKENIZE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "tap_checkout_tokenize_total",
        "Total tokenize requests",
        &["result"]
    )
    .unwrap()
});

pub static AUTHORIZE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "tap_checkout_authorize_total",
        "Total authorize requests",
        &["result"]
    )
    .unwrap()
});

pub static CAPTURE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "tap_checkout_capture_total",
        "Total capture requests",
        &["result"]
    )
    .unwrap()
});

pub static FINALIZE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "tap_checkout_finalize_total",
        "Finalization outcomes",
        &["outcome"]
    )
    .unwrap()
});

pub static WEBHOOK_EVENTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "tap_checkout_webhook_events_total",
        "Webhook events received",
        &["result"]
    )
    .unwrap()
});

pub static GATEWAY_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "tap_checkout_gateway_duration_seconds",
        "Gateway call latency in seconds",
        &["op", "result"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
