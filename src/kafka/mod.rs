// Kafka integration for the moderation round-trip and notification fan-out.
//
// Outbound: moderation requests and per-recipient notifications (producer.rs).
// Inbound: moderation verdicts, consumed by the moderation worker (consumer.rs).

pub mod config;
pub mod consumer;
pub mod metrics;
pub mod producer;
pub mod types;

pub use consumer::VerdictConsumer;
pub use producer::KafkaProducer;
pub use types::{ModerationRequest, ModerationVerdict, Notification};
