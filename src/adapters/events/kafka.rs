//! Kafka-backed producer and consumer (feature `kafka`).
//!
//! Client settings:
//! - producer: `acks=all`, `retries=3`, `linger.ms=5`
//! - consumer: auto-commit every `auto_commit_interval_ms`, new groups start
//!   from the earliest offset

use async_trait::async_trait;
use futures::FutureExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::Arc;
use std::time::Duration;

use crate::config::BrokerConfig;
use crate::domain::foundation::{ProducerRecord, Record, RecordCoordinates};
use crate::ports::{BusError, LogConsumer, LogProducer, ProducerFactory};

const MAX_POLL_RECORDS: usize = 500;

fn require_address(config: &BrokerConfig) -> Result<(), BusError> {
    if config.has_address() {
        Ok(())
    } else {
        Err(BusError::Unavailable(
            "broker address not configured".to_string(),
        ))
    }
}

/// Builds [`KafkaLogProducer`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaProducerFactory;

impl ProducerFactory for KafkaProducerFactory {
    fn create(&self, config: &BrokerConfig) -> Result<Arc<dyn LogProducer>, BusError> {
        Ok(Arc::new(KafkaLogProducer::new(config)?))
    }
}

/// [`LogProducer`] over an rdkafka `FutureProducer`.
pub struct KafkaLogProducer {
    producer: FutureProducer,
    send_timeout: Duration,
}

impl KafkaLogProducer {
    pub fn new(config: &BrokerConfig) -> Result<Self, BusError> {
        require_address(config)?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.address)
            .set("acks", "all")
            .set("retries", "3")
            .set("linger.ms", "5")
            .set("message.timeout.ms", config.send_timeout_ms.to_string())
            .create()
            .map_err(|e| BusError::Unavailable(e.to_string()))?;

        Ok(Self {
            producer,
            send_timeout: config.send_timeout(),
        })
    }
}

#[async_trait]
impl LogProducer for KafkaLogProducer {
    async fn send(&self, record: ProducerRecord) -> Result<RecordCoordinates, BusError> {
        let delivery = self
            .producer
            .send(
                FutureRecord::to(&record.topic)
                    .key(record.key.as_str())
                    .payload(record.value.as_str()),
                Timeout::After(self.send_timeout),
            )
            .await;

        match delivery {
            Ok((partition, offset)) => Ok(RecordCoordinates {
                topic: record.topic,
                partition,
                offset,
            }),
            Err((e, _)) => Err(BusError::Transport(e.to_string())),
        }
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BusError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| BusError::Join(e.to_string()))?
            .map_err(|e| BusError::Transport(e.to_string()))
    }
}

/// [`LogConsumer`] over an rdkafka `StreamConsumer` subscribed to the
/// configured topic.
pub struct KafkaLogConsumer {
    consumer: Option<StreamConsumer>,
}

impl KafkaLogConsumer {
    pub fn new(config: &BrokerConfig) -> Result<Self, BusError> {
        require_address(config)?;

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.address)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set(
                "auto.commit.interval.ms",
                config.auto_commit_interval_ms.to_string(),
            )
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| BusError::Unavailable(e.to_string()))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| BusError::Unavailable(e.to_string()))?;

        tracing::info!(
            address = %config.address,
            group_id = %config.group_id,
            topic = %config.topic,
            "Kafka consumer subscribed"
        );
        Ok(Self {
            consumer: Some(consumer),
        })
    }
}

fn to_record(message: &BorrowedMessage<'_>) -> Record {
    Record {
        key: message
            .key()
            .map(|key| String::from_utf8_lossy(key).into_owned()),
        value: message.payload().map(<[u8]>::to_vec),
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
    }
}

#[async_trait]
impl LogConsumer for KafkaLogConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<Record>, BusError> {
        let consumer = self.consumer.as_ref().ok_or(BusError::Closed)?;

        let first = match tokio::time::timeout(timeout, consumer.recv()).await {
            Err(_) => return Ok(Vec::new()),
            Ok(Err(e)) => return Err(BusError::Transport(e.to_string())),
            Ok(Ok(message)) => to_record(&message),
        };

        // Drain whatever is already buffered without waiting again.
        let mut batch = vec![first];
        while batch.len() < MAX_POLL_RECORDS {
            match consumer.recv().now_or_never() {
                Some(Ok(message)) => batch.push(to_record(&message)),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Error while draining consumer buffer");
                    break;
                }
                None => break,
            }
        }

        Ok(batch)
    }

    async fn close(&mut self) -> Result<(), BusError> {
        let Some(consumer) = self.consumer.take() else {
            return Ok(());
        };

        // Dropping the client commits pending offsets and leaves the group;
        // librdkafka blocks while doing so.
        tokio::task::spawn_blocking(move || {
            consumer.unsubscribe();
            drop(consumer);
        })
        .await
        .map_err(|e| BusError::Join(e.to_string()))?;

        tracing::info!("Kafka consumer closed");
        Ok(())
    }
}
