use anyhow::{Context, Result};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::config::create_client_config;
use super::metrics;
use super::types::{ModerationRequest, Notification, RawNotification};
use crate::config::KafkaConfig;
use crate::pipeline::{ModerationRequester, NotificationSender};

/// Kafka producer for moderation requests and per-recipient notifications
///
/// Both streams are fire-and-forget from the pipeline's point of view: a
/// failed send is reported to the caller, which logs it and moves on.
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    moderation_topic: String,
    notification_topic: String,
    send_timeout: Duration,
}

impl KafkaProducer {
    /// Create the producer from the Kafka configuration
    ///
    /// - `acks`: from `KAFKA_PRODUCER_ACKS` (default `all`)
    /// - `enable.idempotence=true` when acks is `all`
    /// - `linger.ms`: from `KAFKA_PRODUCER_LINGER_MS` (default 10)
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        info!("Initializing Kafka producer...");
        let mut client_config = create_client_config(config);

        client_config
            .set("acks", &config.producer_acks)
            .set("linger.ms", config.producer_linger_ms.to_string())
            .set("compression.type", "lz4")
            .set("request.timeout.ms", "30000")
            .set("message.timeout.ms", "60000");
        if config.producer_acks == "all" || config.producer_acks == "-1" {
            client_config.set("enable.idempotence", "true");
        }

        let producer: FutureProducer = client_config
            .create()
            .context("Failed to create Kafka producer")?;

        info!(
            moderation_topic = %config.moderation_request_topic,
            notification_topic = %config.notification_topic,
            "Kafka producer initialized"
        );

        Ok(Self {
            producer: Arc::new(producer),
            moderation_topic: config.moderation_request_topic.clone(),
            notification_topic: config.notification_topic.clone(),
            send_timeout: Duration::from_millis(config.producer_send_timeout_ms),
        })
    }

    async fn send_json<T: Serialize>(&self, topic: &str, key: &str, value: &T) -> Result<(i32, i64)> {
        let payload = serde_json::to_vec(value).context("Failed to serialize Kafka payload")?;
        let record = FutureRecord::to(topic).key(key).payload(&payload);

        let start = Instant::now();
        match self.producer.send(record, Timeout::After(self.send_timeout)).await {
            Ok((partition, offset)) => {
                let latency = start.elapsed();
                metrics::KAFKA_PRODUCE_SUCCESS.inc();
                metrics::KAFKA_PRODUCE_LATENCY.observe(latency.as_secs_f64());

                debug!(
                    topic = %topic,
                    partition = partition,
                    offset = offset,
                    latency_ms = latency.as_millis() as u64,
                    "Record delivered to Kafka"
                );
                Ok((partition, offset))
            }
            Err((kafka_err, _)) => {
                metrics::KAFKA_PRODUCE_FAILURE.inc();
                error!(
                    error = %kafka_err,
                    topic = %topic,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Failed to send record to Kafka"
                );
                Err(anyhow::anyhow!("Kafka send failed: {}", kafka_err))
            }
        }
    }

    /// Flush pending records (graceful shutdown)
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        info!("Flushing Kafka producer (timeout: {:?})", timeout);
        self.producer
            .flush(Timeout::After(timeout))
            .context("Failed to flush Kafka producer")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ModerationRequester for KafkaProducer {
    async fn request(&self, request: &ModerationRequest) -> Result<()> {
        // Keyed by group so one group's requests stay on one partition
        let key = request.group_id.to_string();
        self.send_json(&self.moderation_topic, &key, request).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationSender for KafkaProducer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let key = notification.to_user_id.to_string();
        self.send_json(&self.notification_topic, &key, &RawNotification::from(notification))
            .await?;
        Ok(())
    }
}
