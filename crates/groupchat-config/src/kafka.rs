// ============================================================================
// Kafka Configuration
// ============================================================================

/// Kafka configuration for the moderation round-trip and notification fan-out
#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Comma-separated list of Kafka brokers (e.g., "kafka1:9092,kafka2:9092")
    pub brokers: String,
    /// Topic the classifier reads moderation requests from
    pub moderation_request_topic: String,
    /// Topic the classifier writes verdicts to
    pub moderation_result_topic: String,
    /// Topic consumed by the notification service
    pub notification_topic: String,
    /// Consumer group ID for the verdict consumer
    pub consumer_group: String,
    /// SSL/TLS enabled
    pub ssl_enabled: bool,
    /// SASL mechanism (e.g., "SCRAM-SHA-256", "PLAIN")
    pub sasl_mechanism: Option<String>,
    /// SASL username
    pub sasl_username: Option<String>,
    /// SASL password
    pub sasl_password: Option<String>,
    /// Path to CA certificate file (for self-signed certificates)
    pub ssl_ca_location: Option<String>,
    // producer-specific settings
    pub producer_acks: String, // "all" | "1" | "-1" | "0"
    pub producer_linger_ms: u32,
    pub producer_send_timeout_ms: u64,
}

impl KafkaConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            brokers: std::env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            moderation_request_topic: std::env::var("KAFKA_MODERATION_REQUEST_TOPIC")
                .unwrap_or_else(|_| "input_hate_speech".to_string()),
            moderation_result_topic: std::env::var("KAFKA_MODERATION_RESULT_TOPIC")
                .unwrap_or_else(|_| "output_hate_speech".to_string()),
            notification_topic: std::env::var("KAFKA_NOTIFICATION_TOPIC")
                .unwrap_or_else(|_| "notifications".to_string()),
            consumer_group: std::env::var("KAFKA_CONSUMER_GROUP")
                .unwrap_or_else(|_| "hate-speech-group".to_string()),
            ssl_enabled: std::env::var("KAFKA_SSL_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            sasl_mechanism: std::env::var("KAFKA_SASL_MECHANISM").ok(),
            sasl_username: std::env::var("KAFKA_SASL_USERNAME").ok(),
            sasl_password: std::env::var("KAFKA_SASL_PASSWORD").ok(),
            ssl_ca_location: std::env::var("KAFKA_SSL_CA_LOCATION").ok(),
            producer_acks: std::env::var("KAFKA_PRODUCER_ACKS")
                .unwrap_or_else(|_| "all".to_string()),
            producer_linger_ms: std::env::var("KAFKA_PRODUCER_LINGER_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            producer_send_timeout_ms: std::env::var("KAFKA_PRODUCER_SEND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
        }
    }
}
