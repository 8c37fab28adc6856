//! Kafka adapters for the ingestion pipeline

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{Offset, TopicPartitionList};
use shared::message::DeadLetterMessage;

use super::{DeadLetterSink, OrderStream, StreamMessage};
use crate::config::Config;
use crate::db::BoxError;

const SEEK_TIMEOUT: Duration = Duration::from_secs(5);
const PRODUCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Subscribed consumer with auto-commit disabled
pub struct KafkaOrderStream {
    consumer: StreamConsumer,
    retry_backoff: Duration,
}

impl KafkaOrderStream {
    pub fn connect(config: &Config) -> Result<Self, BoxError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_brokers)
            .set("group.id", &config.kafka_group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;
        consumer.subscribe(&[config.kafka_topic.as_str()])?;

        tracing::info!(
            brokers = %config.kafka_brokers,
            topic = %config.kafka_topic,
            group_id = %config.kafka_group_id,
            "Kafka consumer subscribed"
        );

        Ok(Self {
            consumer,
            retry_backoff: Duration::from_millis(config.kafka_retry_backoff_ms),
        })
    }
}

#[async_trait]
impl OrderStream for KafkaOrderStream {
    async fn recv(&self) -> Result<StreamMessage, BoxError> {
        let msg = self.consumer.recv().await?;
        Ok(StreamMessage {
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
        })
    }

    async fn commit(&self, msg: &StreamMessage) -> Result<(), BoxError> {
        // Committed offset is the next one to read
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&msg.topic, msg.partition, Offset::Offset(msg.offset + 1))?;
        self.consumer.commit(&tpl, CommitMode::Sync)?;
        Ok(())
    }

    /// Back off, then rewind the partition so the same message is fetched again.
    async fn retry(&self, msg: &StreamMessage) -> Result<(), BoxError> {
        tokio::time::sleep(self.retry_backoff).await;
        self.consumer.seek(
            &msg.topic,
            msg.partition,
            Offset::Offset(msg.offset),
            SEEK_TIMEOUT,
        )?;
        tracing::debug!(
            topic = %msg.topic,
            partition = msg.partition,
            offset = msg.offset,
            "Rewound partition for redelivery"
        );
        Ok(())
    }
}

pub struct KafkaDeadLetterSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaDeadLetterSink {
    pub fn connect(config: &Config) -> Result<Self, BoxError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_brokers)
            .set("message.timeout.ms", "5000")
            .create()?;
        Ok(Self {
            producer,
            topic: config.kafka_dlq_topic.clone(),
        })
    }
}

#[async_trait]
impl DeadLetterSink for KafkaDeadLetterSink {
    async fn send(&self, letter: &DeadLetterMessage) -> Result<(), BoxError> {
        let json = serde_json::to_vec(letter)?;
        let record = FutureRecord::<(), _>::to(&self.topic).payload(&json);
        let (partition, offset) = self
            .producer
            .send(record, PRODUCE_TIMEOUT)
            .await
            .map_err(|(e, _)| e)?;
        tracing::info!(
            topic = %self.topic,
            partition,
            offset,
            source_offset = letter.offset,
            "Dead-letter message published"
        );
        Ok(())
    }
}
