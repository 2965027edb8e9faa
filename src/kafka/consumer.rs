use anyhow::{Context, Result};
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::{Message, Offset, TopicPartitionList};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

use super::config::create_client_config;
use super::metrics;
use crate::config::KafkaConfig;
use crate::pipeline::{ConsumerError, VerdictSource};

/// Kafka consumer for moderation verdicts
///
/// - `enable.auto.commit=false`, `enable.auto.offset.store=false`: the only
///   offset ever committed is the one right after the record the worker last
///   finished with
/// - `auto.offset.reset=earliest`: a new consumer group starts from the oldest verdict
pub struct VerdictConsumer {
    consumer: StreamConsumer,
    /// (topic, partition, offset) of the record last returned by `poll`
    last_polled: Mutex<Option<(String, i32, i64)>>,
}

impl VerdictConsumer {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        info!(
            topic = %config.moderation_result_topic,
            group = %config.consumer_group,
            "Initializing Kafka verdict consumer"
        );

        let consumer: StreamConsumer = create_client_config(config)
            .set("group.id", &config.consumer_group)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "30000")
            .set("heartbeat.interval.ms", "3000")
            .set("max.poll.interval.ms", "300000")
            .create()
            .context("Failed to create Kafka consumer")?;

        consumer
            .subscribe(&[config.moderation_result_topic.as_str()])
            .context("Failed to subscribe to Kafka topic")?;

        Ok(Self {
            consumer,
            last_polled: Mutex::new(None),
        })
    }
}

/// Offsets to commit once the record at `offset` was handled
fn commit_list(topic: &str, partition: i32, offset: i64) -> Result<TopicPartitionList, KafkaError> {
    let mut list = TopicPartitionList::new();
    list.add_partition_offset(topic, partition, Offset::Offset(offset + 1))?;
    Ok(list)
}

fn classify_error(err: KafkaError) -> Result<Option<Vec<u8>>, ConsumerError> {
    match err {
        KafkaError::PartitionEOF(_) => Ok(None),
        KafkaError::MessageConsumption(
            RDKafkaErrorCode::OperationTimedOut | RDKafkaErrorCode::RequestTimedOut,
        ) => Err(ConsumerError::Timeout),
        other => {
            metrics::KAFKA_CONSUME_FAILURE
                .with_label_values(&["transport"])
                .inc();
            Err(ConsumerError::Transport(other.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl VerdictSource for VerdictConsumer {
    async fn poll(&self, timeout: Duration) -> Result<Option<Vec<u8>>, ConsumerError> {
        let message = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => return Err(ConsumerError::Timeout),
            Ok(Err(e)) => return classify_error(e),
            Ok(Ok(message)) => message,
        };

        metrics::KAFKA_CONSUME_SUCCESS.inc();
        if let Ok(mut last) = self.last_polled.lock() {
            *last = Some((
                message.topic().to_string(),
                message.partition(),
                message.offset(),
            ));
        }

        match message.payload() {
            Some(payload) => Ok(Some(payload.to_vec())),
            None => {
                // Tombstone; hand the worker an empty payload so it is skipped and committed
                warn!(
                    topic = %message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    "Verdict record without payload"
                );
                Ok(Some(Vec::new()))
            }
        }
    }

    fn commit(&self) -> Result<(), ConsumerError> {
        let last = self
            .last_polled
            .lock()
            .map_err(|_| ConsumerError::Transport("offset tracker poisoned".to_string()))?
            .take();
        let Some((topic, partition, offset)) = last else {
            return Ok(());
        };

        commit_list(&topic, partition, offset)
            .and_then(|list| self.consumer.commit(&list, CommitMode::Async))
            .map_err(|e| {
                metrics::KAFKA_CONSUME_FAILURE.with_label_values(&["commit"]).inc();
                ConsumerError::Transport(e.to_string())
            })
    }
}
