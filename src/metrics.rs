use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    opts, register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

pub static MESSAGES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_messages_created_total",
        "Total number of persisted group messages"
    ))
    .unwrap()
});

/// Create requests rejected before anything was persisted, by reason
pub static MESSAGES_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "groupchat_messages_rejected_total",
            "Total number of rejected create requests"
        ),
        &["reason"]
    )
    .unwrap()
});

pub static ATTACHMENT_UPLOAD_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_attachment_upload_failures_total",
        "Total number of failed attachment uploads"
    ))
    .unwrap()
});

pub static MODERATION_REQUESTS_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_moderation_requests_sent_total",
        "Total number of moderation requests handed to Kafka"
    ))
    .unwrap()
});

pub static MODERATION_REQUESTS_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_moderation_requests_failed_total",
        "Total number of moderation requests that could not be sent"
    ))
    .unwrap()
});

/// Verdicts by outcome: neutral, hate, ignored
pub static VERDICTS_APPLIED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "groupchat_verdicts_applied_total",
            "Total number of moderation verdicts processed"
        ),
        &["outcome"]
    )
    .unwrap()
});

/// Worker loop errors by kind: malformed, transport, persistence
pub static CONSUMER_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "groupchat_consumer_errors_total",
            "Total number of moderation worker errors"
        ),
        &["kind"]
    )
    .unwrap()
});

pub static NOTIFICATIONS_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_notifications_sent_total",
        "Total number of notifications emitted"
    ))
    .unwrap()
});

pub static NOTIFICATIONS_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_notifications_failed_total",
        "Total number of notifications that could not be emitted"
    ))
    .unwrap()
});

pub static BROADCASTS_FAILED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "groupchat_broadcasts_failed_total",
            "Total number of realtime events that could not be published"
        ),
        &["event"]
    )
    .unwrap()
});

pub static MODERATION_REQUESTS_RESENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "groupchat_moderation_requests_resent_total",
        "Total number of moderation requests re-sent for stale pending messages"
    ))
    .unwrap()
});

pub static CREATE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "groupchat_create_duration_seconds",
        "Histogram of message create latency (upload + persist + broadcast)"
    )
    .unwrap()
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
