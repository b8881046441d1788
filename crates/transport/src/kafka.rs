//! Kafka-backed record source and producer.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Headers, Message as _};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use rdkafka::util::Timeout;

use crate::consumer::RecordSource;
use crate::error::{Result, TransportError};
use crate::message::Message;
use crate::producer::Producer;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

fn broker_error(e: KafkaError) -> TransportError {
    TransportError::Broker {
        fatal: e.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal),
        message: e.to_string(),
    }
}

/// A consumer group subscription backed by an rdkafka [`StreamConsumer`].
///
/// Offsets are stored only through [`RecordSource::ack`] and committed by
/// the client's periodic auto-commit.
pub struct KafkaConsumerSource {
    consumer: StreamConsumer,
}

impl KafkaConsumerSource {
    /// Connects to `brokers` as `group_id` and subscribes to `topics`.
    pub fn new(brokers: &str, group_id: &str, topics: &[&str]) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .create()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        consumer
            .subscribe(topics)
            .map_err(|e| TransportError::Config(e.to_string()))?;

        tracing::info!(group = group_id, ?topics, "subscribed to kafka topics");
        Ok(Self { consumer })
    }
}

fn to_message(m: &BorrowedMessage<'_>) -> Message {
    let headers = m
        .headers()
        .map(|headers| {
            headers
                .iter()
                .map(|h| (h.key.to_string(), h.value.map(<[u8]>::to_vec).unwrap_or_default()))
                .collect()
        })
        .unwrap_or_else(HashMap::new);

    Message {
        key: m.key().map(<[u8]>::to_vec).unwrap_or_default(),
        value: m.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        topic: m.topic().to_string(),
        partition: m.partition(),
        offset: m.offset(),
        timestamp: m.timestamp().to_millis().and_then(DateTime::from_timestamp_millis),
        headers,
    }
}

#[async_trait]
impl RecordSource for KafkaConsumerSource {
    async fn next(&self) -> Result<Option<Message>> {
        let borrowed = self.consumer.recv().await.map_err(broker_error)?;
        Ok(Some(to_message(&borrowed)))
    }

    async fn ack(&self, msg: &Message) -> Result<()> {
        let ack_error = |e: KafkaError| TransportError::Ack {
            topic: msg.topic.clone(),
            partition: msg.partition,
            offset: msg.offset,
            message: e.to_string(),
        };

        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&msg.topic, msg.partition, Offset::Offset(msg.offset + 1))
            .map_err(ack_error)?;
        self.consumer.store_offsets(&offsets).map_err(ack_error)
    }
}

/// Producer bound to one Kafka topic.
pub struct KafkaProducer {
    producer: FutureProducer,
    topic: String,
}

impl KafkaProducer {
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }
}

#[async_trait]
impl Producer for KafkaProducer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let record = FutureRecord::to(&self.topic).key(key).payload(value);

        self.producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
            .map(|_| ())
            .map_err(|(e, _)| TransportError::Publish {
                topic: self.topic.clone(),
                message: e.to_string(),
            })?;

        metrics::counter!("transport_published_total", "topic" => self.topic.clone()).increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_code_is_classified_fatal() {
        let err = broker_error(KafkaError::MessageConsumption(RDKafkaErrorCode::Fatal));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_transport_code_is_transient() {
        let err = broker_error(KafkaError::MessageConsumption(
            RDKafkaErrorCode::BrokerTransportFailure,
        ));
        assert!(!err.is_fatal());
    }
}
