//! In-memory broker with consumer group offsets.
//!
//! Topics are split into partitions, records are routed by key hash, and
//! each consumer group tracks a read position plus a committed offset per
//! partition. [`InMemoryBroker::rebalance`] rewinds a group to its committed
//! offsets, which redelivers every record that was read but not acknowledged.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};

use crate::consumer::RecordSource;
use crate::error::{Result, TransportError};
use crate::message::Message;
use crate::producer::Producer;

const DEFAULT_PARTITIONS: usize = 3;

type PartitionKey = (String, i32);

#[derive(Debug, Default)]
struct GroupState {
    /// Next offset to deliver, per partition.
    positions: HashMap<PartitionKey, i64>,
    /// Next offset to resume from after a rebalance, per partition.
    committed: HashMap<PartitionKey, i64>,
    /// Rotates the partition scan so one busy partition cannot starve others.
    cursor: usize,
}

#[derive(Debug)]
struct BrokerState {
    topics: HashMap<String, Vec<Vec<Message>>>,
    groups: HashMap<String, GroupState>,
    partitions_per_topic: usize,
    fail_on_publish: bool,
}

struct BrokerInner {
    state: Mutex<BrokerState>,
    published: Notify,
}

/// In-memory broker for tests and single-process wiring.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    /// Creates a broker whose topics have three partitions.
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Creates a broker whose topics have `partitions` partitions (at least one).
    pub fn with_partitions(partitions: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                state: Mutex::new(BrokerState {
                    topics: HashMap::new(),
                    groups: HashMap::new(),
                    partitions_per_topic: partitions.max(1),
                    fail_on_publish: false,
                }),
                published: Notify::new(),
            }),
        }
    }

    /// Configures the broker to reject every publish.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.inner.state.lock().await.fail_on_publish = fail;
    }

    /// Appends a record to `topic`, returning its partition and offset.
    pub async fn publish(
        &self,
        topic: &str,
        key: &[u8],
        value: &[u8],
        headers: HashMap<String, Vec<u8>>,
    ) -> Result<(i32, i64)> {
        let mut state = self.inner.state.lock().await;
        if state.fail_on_publish {
            return Err(TransportError::Publish {
                topic: topic.to_string(),
                message: "broker unavailable".to_string(),
            });
        }

        let partition_count = state.partitions_per_topic;
        let partitions = state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| vec![Vec::new(); partition_count]);

        let partition = partition_for(key, partitions.len());
        let log = &mut partitions[partition];
        let offset = log.len() as i64;
        log.push(Message {
            key: key.to_vec(),
            value: value.to_vec(),
            topic: topic.to_string(),
            partition: partition as i32,
            offset,
            timestamp: Some(Utc::now()),
            headers,
        });
        drop(state);

        self.inner.published.notify_waiters();
        Ok((partition as i32, offset))
    }

    /// Subscribes `group_id` to `topics`.
    ///
    /// Several sources for the same group share positions, as members of one
    /// group would.
    pub fn subscribe(&self, group_id: impl Into<String>, topics: &[&str]) -> InMemorySource {
        InMemorySource {
            broker: self.clone(),
            group_id: group_id.into(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Returns a producer bound to `topic`.
    pub fn producer(&self, topic: impl Into<String>) -> InMemoryProducer {
        InMemoryProducer {
            broker: self.clone(),
            topic: topic.into(),
        }
    }

    /// Returns every record published to `topic`, partition by partition.
    pub async fn records(&self, topic: &str) -> Vec<Message> {
        let state = self.inner.state.lock().await;
        state
            .topics
            .get(topic)
            .map(|partitions| partitions.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the committed offset (next offset to read) of a group partition.
    pub async fn committed_offset(&self, group_id: &str, topic: &str, partition: i32) -> Option<i64> {
        let state = self.inner.state.lock().await;
        state
            .groups
            .get(group_id)
            .and_then(|g| g.committed.get(&(topic.to_string(), partition)))
            .copied()
    }

    /// Rewinds a group to its committed offsets, as a partition reassignment would.
    pub async fn rebalance(&self, group_id: &str) {
        let mut state = self.inner.state.lock().await;
        if let Some(group) = state.groups.get_mut(group_id) {
            group.positions = group.committed.clone();
        }
        drop(state);
        self.inner.published.notify_waiters();
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

fn partition_for(key: &[u8], partitions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partitions as u64) as usize
}

/// A consumer group subscription on an [`InMemoryBroker`].
pub struct InMemorySource {
    broker: InMemoryBroker,
    group_id: String,
    topics: Vec<String>,
}

impl InMemorySource {
    async fn try_next(&self) -> Option<Message> {
        let mut state = self.broker.inner.state.lock().await;
        let BrokerState { topics, groups, .. } = &mut *state;
        let group = groups.entry(self.group_id.clone()).or_default();

        let assigned: Vec<(&String, usize)> = self
            .topics
            .iter()
            .filter_map(|topic| topics.get(topic).map(|p| (topic, p.len())))
            .flat_map(|(topic, count)| (0..count).map(move |p| (topic, p)))
            .collect();
        if assigned.is_empty() {
            return None;
        }

        for step in 0..assigned.len() {
            let (topic, partition) = assigned[(group.cursor + step) % assigned.len()];
            let key = (topic.clone(), partition as i32);
            let position = group
                .positions
                .get(&key)
                .or_else(|| group.committed.get(&key))
                .copied()
                .unwrap_or(0);

            if let Some(msg) = topics[topic][partition].get(position as usize) {
                group.positions.insert(key, position + 1);
                group.cursor = (group.cursor + step + 1) % assigned.len();
                return Some(msg.clone());
            }
        }
        None
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn next(&self) -> Result<Option<Message>> {
        loop {
            let published = self.broker.inner.published.notified();
            tokio::pin!(published);
            published.as_mut().enable();

            if let Some(msg) = self.try_next().await {
                return Ok(Some(msg));
            }
            published.await;
        }
    }

    async fn ack(&self, msg: &Message) -> Result<()> {
        let mut state = self.broker.inner.state.lock().await;
        let group = state.groups.entry(self.group_id.clone()).or_default();
        let committed = group
            .committed
            .entry((msg.topic.clone(), msg.partition))
            .or_insert(0);
        *committed = (*committed).max(msg.offset + 1);
        Ok(())
    }
}

/// Producer that appends to a topic of an [`InMemoryBroker`].
#[derive(Clone)]
pub struct InMemoryProducer {
    broker: InMemoryBroker,
    topic: String,
}

#[async_trait]
impl Producer for InMemoryProducer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.broker
            .publish(&self.topic, key, value, HashMap::new())
            .await?;
        metrics::counter!("transport_published_total", "topic" => self.topic.clone()).increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_routes_to_same_partition() {
        let broker = InMemoryBroker::with_partitions(4);
        let (p1, o1) = broker.publish("t", b"order-1", b"a", HashMap::new()).await.unwrap();
        let (p2, o2) = broker.publish("t", b"order-1", b"b", HashMap::new()).await.unwrap();

        assert_eq!(p1, p2);
        assert_eq!(o1, 0);
        assert_eq!(o2, 1);
    }

    #[tokio::test]
    async fn test_groups_track_offsets_independently() {
        let broker = InMemoryBroker::with_partitions(1);
        broker.publish("t", b"k", b"v", HashMap::new()).await.unwrap();

        let a = broker.subscribe("a", &["t"]);
        let b = broker.subscribe("b", &["t"]);

        let from_a = a.next().await.unwrap().unwrap();
        let from_b = b.next().await.unwrap().unwrap();
        assert_eq!(from_a, from_b);

        a.ack(&from_a).await.unwrap();
        assert_eq!(broker.committed_offset("a", "t", 0).await, Some(1));
        assert_eq!(broker.committed_offset("b", "t", 0).await, None);
    }

    #[tokio::test]
    async fn test_rebalance_redelivers_unacknowledged() {
        let broker = InMemoryBroker::with_partitions(1);
        broker.publish("t", b"k", b"first", HashMap::new()).await.unwrap();
        broker.publish("t", b"k", b"second", HashMap::new()).await.unwrap();

        let source = broker.subscribe("g", &["t"]);
        let first = source.next().await.unwrap().unwrap();
        source.ack(&first).await.unwrap();
        let second = source.next().await.unwrap().unwrap();
        assert_eq!(second.value, b"second");

        broker.rebalance("g").await;

        let redelivered = source.next().await.unwrap().unwrap();
        assert_eq!(redelivered.value, b"second");
        assert_eq!(redelivered.offset, 1);
    }

    #[tokio::test]
    async fn test_next_waits_for_publish() {
        let broker = InMemoryBroker::new();
        let source = broker.subscribe("g", &["t"]);

        let publisher = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            publisher.publish("t", b"k", b"late", HashMap::new()).await.unwrap();
        });

        let msg = tokio::time::timeout(std::time::Duration::from_secs(1), source.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(msg.value, b"late");
    }

    #[tokio::test]
    async fn test_producer_failure_is_reported() {
        let broker = InMemoryBroker::new();
        let producer = broker.producer("order.paid");
        broker.set_fail_on_publish(true).await;

        let result = producer.send(b"k", b"v").await;

        assert!(matches!(result, Err(TransportError::Publish { .. })));
        assert!(broker.records("order.paid").await.is_empty());
    }
}
