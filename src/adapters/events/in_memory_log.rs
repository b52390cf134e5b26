//! In-memory partitioned log for tests and local runs.
//!
//! Mirrors the broker semantics the bridge relies on:
//! - records with the same key land in the same partition, in append order
//! - each consumer group tracks its own committed offsets
//! - a new group starts from the earliest record
//! - offsets are auto-committed: positions reached by one poll are committed
//!   at the start of the next poll, and on close
//!
//! It also offers fault injection (failing polls and sends, raw records with
//! missing or malformed values) for exercising the error paths.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

use crate::config::BrokerConfig;
use crate::domain::foundation::{ProducerRecord, Record, RecordCoordinates};
use crate::ports::{BusError, LogConsumer, LogProducer, ProducerFactory};

const DEFAULT_PARTITIONS: usize = 3;
const MAX_POLL_RECORDS: usize = 500;

#[derive(Debug, Clone)]
struct StoredRecord {
    key: Option<String>,
    value: Option<Vec<u8>>,
}

#[derive(Default)]
struct LogState {
    topics: HashMap<String, Vec<Vec<StoredRecord>>>,
    committed: HashMap<(String, String, i32), i64>,
    failing_polls: usize,
    failing_sends: usize,
}

struct LogInner {
    partitions: usize,
    state: Mutex<LogState>,
    appended: Notify,
}

impl LogInner {
    fn state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn partition_for(&self, key: Option<&str>) -> i32 {
        let mut hasher = DefaultHasher::new();
        key.unwrap_or("").hash(&mut hasher);
        (hasher.finish() % self.partitions as u64) as i32
    }

    fn append(&self, topic: &str, key: Option<String>, value: Option<Vec<u8>>) -> RecordCoordinates {
        let partition = self.partition_for(key.as_deref());
        let offset = {
            let mut state = self.state();
            let partitions = state
                .topics
                .entry(topic.to_string())
                .or_insert_with(|| vec![Vec::new(); self.partitions]);
            let log = &mut partitions[partition as usize];
            log.push(StoredRecord { key, value });
            (log.len() - 1) as i64
        };
        self.appended.notify_waiters();

        RecordCoordinates {
            topic: topic.to_string(),
            partition,
            offset,
        }
    }
}

/// Shared in-memory log. Clones share the same records.
///
/// # Example
///
/// ```ignore
/// let log = InMemoryLog::new();
/// let consumer = log.consumer("person-service-group", &["app-global-topic"]);
/// log.append("app-global-topic", Some("CreatePersonEvent"), Some(br#"{"name":"John","age":31}"#));
/// ```
#[derive(Clone)]
pub struct InMemoryLog {
    inner: Arc<LogInner>,
}

impl InMemoryLog {
    /// Creates an empty log with three partitions per topic.
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    pub fn with_partitions(partitions: usize) -> Self {
        Self {
            inner: Arc::new(LogInner {
                partitions: partitions.max(1),
                state: Mutex::new(LogState::default()),
                appended: Notify::new(),
            }),
        }
    }

    /// A producer appending to this log.
    pub fn producer(&self) -> InMemoryProducer {
        InMemoryProducer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// A consumer in `group_id` subscribed to `topics`.
    ///
    /// Consumers in the same group resume from the group's committed
    /// offsets; each group sees every record.
    pub fn consumer(&self, group_id: &str, topics: &[&str]) -> InMemoryConsumer {
        InMemoryConsumer {
            inner: Arc::clone(&self.inner),
            group_id: group_id.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            positions: HashMap::new(),
            closed: false,
        }
    }

    /// Consumer for the group and topic named in `config`.
    pub fn consumer_for(&self, config: &BrokerConfig) -> InMemoryConsumer {
        self.consumer(&config.group_id, &[config.topic.as_str()])
    }

    // === Test Helpers ===

    /// Append a raw record, bypassing serialization.
    ///
    /// Use this for tombstones (`value: None`), blank values, and payloads
    /// that are not JSON.
    pub fn append(&self, topic: &str, key: Option<&str>, value: Option<&[u8]>) -> RecordCoordinates {
        self.inner
            .append(topic, key.map(str::to_string), value.map(<[u8]>::to_vec))
    }

    /// Every record in `topic`, partition by partition.
    pub fn records(&self, topic: &str) -> Vec<Record> {
        let state = self.inner.state();
        let Some(partitions) = state.topics.get(topic) else {
            return Vec::new();
        };

        partitions
            .iter()
            .enumerate()
            .flat_map(|(partition, log)| {
                log.iter().enumerate().map(move |(offset, stored)| Record {
                    key: stored.key.clone(),
                    value: stored.value.clone(),
                    topic: topic.to_string(),
                    partition: partition as i32,
                    offset: offset as i64,
                })
            })
            .collect()
    }

    /// Number of records in `topic`.
    pub fn record_count(&self, topic: &str) -> usize {
        self.inner
            .state()
            .topics
            .get(topic)
            .map(|partitions| partitions.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Partition a key is written to.
    pub fn partition_for(&self, key: &str) -> i32 {
        self.inner.partition_for(Some(key))
    }

    /// Next offset `group_id` will read from the partition, once committed.
    pub fn committed_offset(&self, group_id: &str, topic: &str, partition: i32) -> Option<i64> {
        self.inner
            .state()
            .committed
            .get(&(group_id.to_string(), topic.to_string(), partition))
            .copied()
    }

    /// Make the next `count` polls (across all consumers) fail.
    pub fn fail_next_polls(&self, count: usize) {
        self.inner.state().failing_polls = count;
    }

    /// Make the next `count` sends fail.
    pub fn fail_next_sends(&self, count: usize) {
        self.inner.state().failing_sends = count;
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProducerFactory for InMemoryLog {
    fn create(&self, _config: &BrokerConfig) -> Result<Arc<dyn LogProducer>, BusError> {
        Ok(Arc::new(self.producer()))
    }
}

/// Producer side of [`InMemoryLog`].
pub struct InMemoryProducer {
    inner: Arc<LogInner>,
}

#[async_trait]
impl LogProducer for InMemoryProducer {
    async fn send(&self, record: ProducerRecord) -> Result<RecordCoordinates, BusError> {
        {
            let mut state = self.inner.state();
            if state.failing_sends > 0 {
                state.failing_sends -= 1;
                return Err(BusError::Transport("injected send failure".to_string()));
            }
        }

        Ok(self.inner.append(
            &record.topic,
            Some(record.key),
            Some(record.value.into_bytes()),
        ))
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), BusError> {
        Ok(())
    }
}

/// Consumer side of [`InMemoryLog`], bound to one group.
pub struct InMemoryConsumer {
    inner: Arc<LogInner>,
    group_id: String,
    topics: Vec<String>,
    positions: HashMap<(String, i32), i64>,
    closed: bool,
}

impl InMemoryConsumer {
    fn commit(&self) {
        let mut state = self.inner.state();
        for ((topic, partition), offset) in &self.positions {
            state
                .committed
                .insert((self.group_id.clone(), topic.clone(), *partition), *offset);
        }
    }

    /// Take up to `MAX_POLL_RECORDS` unread records, advancing positions.
    fn fetch(&mut self) -> Result<Vec<Record>, BusError> {
        let mut state = self.inner.state();
        if state.failing_polls > 0 {
            state.failing_polls -= 1;
            return Err(BusError::Transport("injected poll failure".to_string()));
        }

        let mut batch = Vec::new();
        for topic in &self.topics {
            let Some(partitions) = state.topics.get(topic) else {
                continue;
            };

            for (partition, log) in partitions.iter().enumerate() {
                let partition = partition as i32;
                let position = self
                    .positions
                    .entry((topic.clone(), partition))
                    .or_insert_with(|| {
                        state
                            .committed
                            .get(&(self.group_id.clone(), topic.clone(), partition))
                            .copied()
                            .unwrap_or(0)
                    });

                while (*position as usize) < log.len() && batch.len() < MAX_POLL_RECORDS {
                    let stored = &log[*position as usize];
                    batch.push(Record {
                        key: stored.key.clone(),
                        value: stored.value.clone(),
                        topic: topic.clone(),
                        partition,
                        offset: *position,
                    });
                    *position += 1;
                }
            }
        }

        Ok(batch)
    }
}

#[async_trait]
impl LogConsumer for InMemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<Record>, BusError> {
        if self.closed {
            return Err(BusError::Closed);
        }
        self.commit();

        let inner = Arc::clone(&self.inner);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let appended = inner.appended.notified();
            let batch = self.fetch()?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            if tokio::time::timeout_at(deadline, appended).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn close(&mut self) -> Result<(), BusError> {
        if !self.closed {
            self.commit();
            self.closed = true;
        }
        Ok(())
    }
}
