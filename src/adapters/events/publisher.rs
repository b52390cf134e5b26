//! Publisher - fire-and-forget envelope sends to one topic.
//!
//! `send` serializes on the caller's task and hands the record to a spawned
//! delivery task, returning before the broker acknowledges. The delivery
//! outcome is only logged. `close` waits for outstanding deliveries (bounded
//! by the close timeout) and flushes the producer.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use crate::domain::foundation::{Envelope, EventKey, ProducerRecord};
use crate::ports::{BusError, LogProducer};

/// Count of deliveries still in flight.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.current() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Sends envelopes to a single topic.
///
/// Safe to share across tasks; clone the `Arc` it is handed out in.
pub struct Publisher {
    topic: String,
    producer: Arc<dyn LogProducer>,
    runtime: Handle,
    in_flight: Arc<InFlight>,
    closed: AtomicBool,
    close_timeout: Duration,
}

impl Publisher {
    /// Bind `producer` to `topic`.
    ///
    /// Must be called from within a Tokio runtime; deliveries are spawned on
    /// it.
    pub fn new(
        topic: impl Into<String>,
        producer: Arc<dyn LogProducer>,
        close_timeout: Duration,
    ) -> Result<Self, BusError> {
        let runtime = Handle::try_current()
            .map_err(|e| BusError::Unavailable(format!("no async runtime: {}", e)))?;

        Ok(Self {
            topic: topic.into(),
            producer,
            runtime,
            in_flight: Arc::new(InFlight::default()),
            closed: AtomicBool::new(false),
            close_timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Deliveries spawned but not yet acknowledged or failed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Serialize `envelope` and queue it for delivery.
    ///
    /// Returns once the record is handed off. Broker failures after that
    /// point are logged, not returned.
    ///
    /// # Errors
    ///
    /// - `Closed` after [`Publisher::close`]
    /// - `Serialization` if the payload cannot be encoded as JSON
    pub fn send<T: Serialize>(&self, envelope: &Envelope<T>) -> Result<(), BusError> {
        let value = serde_json::to_string(envelope.payload())?;
        self.dispatch(ProducerRecord {
            topic: self.topic.clone(),
            key: envelope.event_key().to_string(),
            value,
        })
    }

    /// Wrap `payload` under `event_name` and send it.
    pub fn send_event<T: Serialize>(&self, event_name: &str, payload: &T) -> Result<(), BusError> {
        let event_key = EventKey::new(event_name)?;
        let value = serde_json::to_string(payload)?;
        self.dispatch(ProducerRecord {
            topic: self.topic.clone(),
            key: event_key.to_string(),
            value,
        })
    }

    fn dispatch(&self, record: ProducerRecord) -> Result<(), BusError> {
        // Register before checking `closed` so close() always waits for us.
        self.in_flight.enter();
        if self.is_closed() {
            self.in_flight.exit();
            return Err(BusError::Closed);
        }

        let producer = Arc::clone(&self.producer);
        let in_flight = Arc::clone(&self.in_flight);
        self.runtime.spawn(async move {
            let event_key = record.key.clone();
            match producer.send(record).await {
                Ok(coordinates) => {
                    tracing::debug!(
                        event_key = %event_key,
                        topic = %coordinates.topic,
                        partition = coordinates.partition,
                        offset = coordinates.offset,
                        "Event delivered"
                    );
                }
                Err(e) => {
                    tracing::error!(event_key = %event_key, error = %e, "Event delivery failed");
                }
            }
            in_flight.exit();
        });

        Ok(())
    }

    /// Stop accepting sends, wait for in-flight deliveries and flush.
    ///
    /// Idempotent: only the first call does any work.
    pub async fn close(&self) -> Result<(), BusError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let pending = self.in_flight();
        if tokio::time::timeout(self.close_timeout, self.in_flight.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                topic = %self.topic,
                pending = self.in_flight(),
                "Timed out waiting for in-flight deliveries"
            );
        }

        self.producer.flush(self.close_timeout).await?;
        tracing::info!(topic = %self.topic, drained = pending, "Publisher closed");
        Ok(())
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .field("in_flight", &self.in_flight())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RecordCoordinates;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Producer that records what it was sent, optionally after a delay.
    #[derive(Default)]
    struct RecordingProducer {
        sent: Mutex<Vec<ProducerRecord>>,
        delay: Duration,
        fail: bool,
        flushed: AtomicUsize,
    }

    #[async_trait]
    impl LogProducer for RecordingProducer {
        async fn send(&self, record: ProducerRecord) -> Result<RecordCoordinates, BusError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(BusError::Transport("broker down".into()));
            }
            let mut sent = self.sent.lock().unwrap();
            let offset = sent.len() as i64;
            let topic = record.topic.clone();
            sent.push(record);
            Ok(RecordCoordinates {
                topic,
                partition: 0,
                offset,
            })
        }

        async fn flush(&self, _: Duration) -> Result<(), BusError> {
            self.flushed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn publisher(producer: Arc<RecordingProducer>) -> Publisher {
        Publisher::new("app-global-topic", producer, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn construction_outside_runtime_is_unavailable() {
        let result = Publisher::new(
            "topic",
            Arc::new(RecordingProducer::default()),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(e) if e.is_unavailable()));
    }

    #[tokio::test]
    async fn send_delivers_key_and_json_payload() {
        let producer = Arc::new(RecordingProducer::default());
        let publisher = publisher(producer.clone());

        let envelope = Envelope::new("CreatePersonEvent", json!({"name": "John", "age": 31})).unwrap();
        publisher.send(&envelope).unwrap();
        publisher.close().await.unwrap();

        let sent = producer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "app-global-topic");
        assert_eq!(sent[0].key, "CreatePersonEvent");
        let value: serde_json::Value = serde_json::from_str(&sent[0].value).unwrap();
        assert_eq!(value, json!({"name": "John", "age": 31}));
    }

    #[tokio::test]
    async fn send_event_rejects_blank_name() {
        let publisher = publisher(Arc::new(RecordingProducer::default()));
        let result = publisher.send_event("  ", &json!({}));
        assert!(matches!(result, Err(BusError::InvalidEventKey(_))));
        assert_eq!(publisher.in_flight(), 0);
    }

    #[tokio::test]
    async fn close_waits_for_in_flight_deliveries() {
        let producer = Arc::new(RecordingProducer {
            delay: Duration::from_millis(50),
            ..RecordingProducer::default()
        });
        let publisher = publisher(producer.clone());

        for i in 0..5 {
            publisher.send_event("Tick", &json!({ "n": i })).unwrap();
        }
        publisher.close().await.unwrap();

        assert_eq!(publisher.in_flight(), 0);
        assert_eq!(producer.sent.lock().unwrap().len(), 5);
        assert_eq!(producer.flushed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_after_close_is_rejected() {
        let publisher = publisher(Arc::new(RecordingProducer::default()));
        publisher.close().await.unwrap();

        let result = publisher.send_event("Tick", &json!({}));
        assert!(matches!(result, Err(BusError::Closed)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let producer = Arc::new(RecordingProducer::default());
        let publisher = publisher(producer.clone());

        publisher.close().await.unwrap();
        publisher.close().await.unwrap();

        assert!(publisher.is_closed());
        assert_eq!(producer.flushed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn close_racing_concurrent_senders_loses_nothing_accepted() {
        let producer = Arc::new(RecordingProducer {
            delay: Duration::from_millis(1),
            ..RecordingProducer::default()
        });
        let publisher = Arc::new(publisher(producer.clone()));

        let senders: Vec<_> = (0..8)
            .map(|task| {
                let publisher = Arc::clone(&publisher);
                tokio::spawn(async move {
                    let mut accepted = 0;
                    for n in 0..100 {
                        match publisher.send_event("Tick", &json!({ "task": task, "n": n })) {
                            Ok(()) => accepted += 1,
                            Err(BusError::Closed) => {}
                            Err(e) => panic!("unexpected send error: {}", e),
                        }
                        tokio::task::yield_now().await;
                    }
                    accepted
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(5)).await;
        publisher.close().await.unwrap();

        let mut accepted = 0;
        for sender in senders {
            accepted += sender.await.unwrap();
        }

        assert_eq!(publisher.in_flight(), 0);
        assert_eq!(producer.sent.lock().unwrap().len(), accepted);
        assert!(publisher.send_event("Tick", &json!({})).is_err());
    }

    #[tokio::test]
    async fn delivery_failure_is_not_returned_to_sender() {
        let producer = Arc::new(RecordingProducer {
            fail: true,
            ..RecordingProducer::default()
        });
        let publisher = publisher(producer.clone());

        assert!(publisher.send_event("Tick", &json!({})).is_ok());
        publisher.close().await.unwrap();

        assert!(producer.sent.lock().unwrap().is_empty());
    }
}
