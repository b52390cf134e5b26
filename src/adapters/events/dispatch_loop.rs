//! DispatchLoop - background task that routes polled records to handlers.
//!
//! ```text
//!   ┌────────┐  poll   ┌─────────┐  per record  ┌────────────┐
//!   │ Idle   │ ──────► │ Polling │ ───────────► │ Processing │
//!   └────────┘         └─────────┘ ◄─────────── └────────────┘
//!                           │ stop                    │ stop (Drop policy)
//!                           ▼                         ▼
//!                       ┌─────────┐ ◄─────────────────┘
//!                       │ Stopped │  consumer closed
//!                       └─────────┘
//! ```
//!
//! Records are processed one at a time, in the order the consumer returned
//! them. Nothing a record or a handler does can end the loop: tombstones are
//! skipped, malformed JSON is logged and dropped, and handler errors, panics
//! and timeouts are logged per handler. Only the stop signal ends it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value as JsonValue;
use tokio::sync::watch;

use super::registry::HandlerRegistry;
use super::type_resolver::{DispatchError, RegisteredHandler};
use crate::config::{BrokerConfig, DispatchConfig, ShutdownPolicy};
use crate::domain::foundation::Record;
use crate::ports::LogConsumer;

/// Lifecycle of a dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Polling,
    Processing,
    Stopped,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LoopState::Polling,
            2 => LoopState::Processing,
            3 => LoopState::Stopped,
            _ => LoopState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LoopState::Idle => 0,
            LoopState::Polling => 1,
            LoopState::Processing => 2,
            LoopState::Stopped => 3,
        }
    }
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Missing or blank value; skipped.
    Tombstone,
    /// Value was not JSON; dropped.
    Malformed,
    /// No handler registered for the key; dropped.
    Unhandled,
    /// Handlers were invoked.
    Dispatched { succeeded: usize, failed: usize },
}

/// Counters shared between the loop and whoever owns it.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    state: AtomicU8,
    records: AtomicU64,
    tombstones: AtomicU64,
    malformed: AtomicU64,
    unhandled: AtomicU64,
    handler_successes: AtomicU64,
    handler_failures: AtomicU64,
    poll_failures: AtomicU64,
}

/// Point-in-time copy of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub records: u64,
    pub tombstones: u64,
    pub malformed: u64,
    pub unhandled: u64,
    pub handler_successes: u64,
    pub handler_failures: u64,
    pub poll_failures: u64,
}

impl DispatchMetrics {
    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records: self.records.load(Ordering::Relaxed),
            tombstones: self.tombstones.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            handler_successes: self.handler_successes.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }

    fn set_state(&self, state: LoopState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Routes individual records to their handlers.
///
/// Split from [`DispatchLoop`] so a record can be processed without a
/// consumer behind it.
pub struct RecordDispatcher {
    registry: Arc<HandlerRegistry>,
    handler_timeout: Duration,
    metrics: Arc<DispatchMetrics>,
}

impl RecordDispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, handler_timeout: Duration) -> Self {
        Self {
            registry,
            handler_timeout,
            metrics: Arc::new(DispatchMetrics::default()),
        }
    }

    /// Share an existing metrics sink instead of a private one.
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parse `record` once and invoke every handler registered for its key.
    pub async fn process_record(&self, record: &Record) -> RecordOutcome {
        DispatchMetrics::bump(&self.metrics.records);
        let event_key = record.key_str();

        let value = match record.value.as_deref() {
            Some(value) if !record.is_tombstone() => value,
            _ => {
                tracing::debug!(
                    event_key = %event_key,
                    coordinates = %record.coordinates(),
                    "Skipping tombstone record"
                );
                DispatchMetrics::bump(&self.metrics.tombstones);
                return RecordOutcome::Tombstone;
            }
        };

        let payload: JsonValue = match serde_json::from_slice(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    event_key = %event_key,
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "Dropping record with malformed JSON payload"
                );
                DispatchMetrics::bump(&self.metrics.malformed);
                return RecordOutcome::Malformed;
            }
        };

        let handlers = self.registry.lookup(event_key);
        if handlers.is_empty() {
            tracing::debug!(event_key = %event_key, "No handler registered for event key");
            DispatchMetrics::bump(&self.metrics.unhandled);
            return RecordOutcome::Unhandled;
        }

        let mut succeeded = 0;
        let mut failed = 0;
        for handler in handlers.iter() {
            match self.invoke(handler, &payload).await {
                Ok(()) => {
                    succeeded += 1;
                    DispatchMetrics::bump(&self.metrics.handler_successes);
                    tracing::debug!(
                        handler = handler.name(),
                        event_key = %event_key,
                        "Event handled"
                    );
                }
                Err(e) => {
                    failed += 1;
                    DispatchMetrics::bump(&self.metrics.handler_failures);
                    tracing::error!(
                        handler = handler.name(),
                        event_key = %event_key,
                        coordinates = %record.coordinates(),
                        error = %e,
                        "Event handler failed"
                    );
                }
            }
        }

        RecordOutcome::Dispatched { succeeded, failed }
    }

    async fn invoke(
        &self,
        handler: &RegisteredHandler,
        payload: &JsonValue,
    ) -> Result<(), DispatchError> {
        let guarded = AssertUnwindSafe(handler.dispatch(payload)).catch_unwind();
        match tokio::time::timeout(self.handler_timeout, guarded).await {
            Err(_) => Err(DispatchError::TimedOut(self.handler_timeout)),
            Ok(Err(panic)) => Err(DispatchError::Panicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Configuration for the DispatchLoop.
#[derive(Debug, Clone)]
pub struct DispatchLoopConfig {
    /// Upper bound on a single poll wait.
    pub poll_timeout: Duration,

    /// Upper bound on a single handler invocation.
    pub handler_timeout: Duration,

    /// What to do with the rest of a fetched batch once stop is requested.
    pub shutdown: ShutdownPolicy,
}

impl Default for DispatchLoopConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(1000),
            handler_timeout: Duration::from_millis(30_000),
            shutdown: ShutdownPolicy::Drop,
        }
    }
}

impl DispatchLoopConfig {
    pub fn from_config(broker: &BrokerConfig, dispatch: &DispatchConfig) -> Self {
        Self {
            poll_timeout: broker.poll_timeout(),
            handler_timeout: dispatch.handler_timeout(),
            shutdown: dispatch.shutdown,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn with_shutdown(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown = policy;
        self
    }
}

/// Long-running consumer task.
///
/// Owns the consumer exclusively; handlers come from the shared registry so
/// they can change while the loop runs.
pub struct DispatchLoop {
    consumer: Box<dyn LogConsumer>,
    dispatcher: RecordDispatcher,
    config: DispatchLoopConfig,
}

impl DispatchLoop {
    pub fn new(
        consumer: Box<dyn LogConsumer>,
        registry: Arc<HandlerRegistry>,
        config: DispatchLoopConfig,
    ) -> Self {
        let dispatcher = RecordDispatcher::new(registry, config.handler_timeout);
        Self {
            consumer,
            dispatcher,
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.dispatcher = self.dispatcher.with_metrics(metrics);
        self
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.dispatcher.metrics()
    }

    /// Run until `shutdown` turns `true` (or its sender is dropped), then
    /// close the consumer.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let metrics = self.dispatcher.metrics();
        tracing::info!(
            poll_timeout = ?self.config.poll_timeout,
            handler_timeout = ?self.config.handler_timeout,
            shutdown_policy = ?self.config.shutdown,
            "Dispatch loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            metrics.set_state(LoopState::Polling);
            let polled = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                polled = self.consumer.poll(self.config.poll_timeout) => polled,
            };

            let records = match polled {
                Ok(records) => records,
                Err(e) => {
                    DispatchMetrics::bump(&metrics.poll_failures);
                    tracing::warn!(error = %e, "Poll failed, retrying");
                    // Back off one poll interval; a consumer that fails
                    // without waiting would otherwise starve the runtime.
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                        _ = tokio::time::sleep(self.config.poll_timeout) => {}
                    }
                    continue;
                }
            };

            if records.is_empty() {
                continue;
            }

            metrics.set_state(LoopState::Processing);
            let total = records.len();
            for (index, record) in records.iter().enumerate() {
                if self.config.shutdown == ShutdownPolicy::Drop && *shutdown.borrow() {
                    tracing::info!(
                        dropped = total - index,
                        "Stop requested, leaving rest of batch unprocessed"
                    );
                    break;
                }
                self.dispatcher.process_record(record).await;
            }
        }

        if let Err(e) = self.consumer.close().await {
            tracing::warn!(error = %e, "Failed to close consumer");
        }
        metrics.set_state(LoopState::Stopped);
        tracing::info!("Dispatch loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::{BusError, EventConsumer};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        text: String,
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventConsumer for Recorder {
        type Payload = Greeting;

        fn event_key(&self) -> &str {
            "Greet"
        }

        async fn handle(&self, payload: Greeting) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(payload.text);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventConsumer for Failing {
        type Payload = JsonValue;

        fn event_key(&self) -> &str {
            "Greet"
        }

        async fn handle(&self, _: JsonValue) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "boom"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl EventConsumer for Panicking {
        type Payload = JsonValue;

        fn event_key(&self) -> &str {
            "Greet"
        }

        async fn handle(&self, _: JsonValue) -> Result<(), DomainError> {
            panic!("handler exploded");
        }
    }

    struct Sleeping;

    #[async_trait]
    impl EventConsumer for Sleeping {
        type Payload = JsonValue;

        fn event_key(&self) -> &str {
            "Greet"
        }

        async fn handle(&self, _: JsonValue) -> Result<(), DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    /// Handler that requests shutdown the first time it runs.
    struct Stopper {
        shutdown: watch::Sender<bool>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventConsumer for Stopper {
        type Payload = Greeting;

        fn event_key(&self) -> &str {
            "Greet"
        }

        async fn handle(&self, payload: Greeting) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(payload.text);
            let _ = self.shutdown.send(true);
            Ok(())
        }
    }

    /// Consumer serving scripted poll results, then empty batches.
    struct ScriptedConsumer {
        polls: VecDeque<Result<Vec<Record>, BusError>>,
        closed: Arc<Mutex<bool>>,
    }

    impl ScriptedConsumer {
        fn new(polls: Vec<Result<Vec<Record>, BusError>>) -> (Self, Arc<Mutex<bool>>) {
            let closed = Arc::new(Mutex::new(false));
            (
                Self {
                    polls: polls.into(),
                    closed: Arc::clone(&closed),
                },
                closed,
            )
        }
    }

    #[async_trait]
    impl LogConsumer for ScriptedConsumer {
        async fn poll(&mut self, timeout: Duration) -> Result<Vec<Record>, BusError> {
            match self.polls.pop_front() {
                Some(result) => result,
                None => {
                    tokio::time::sleep(timeout).await;
                    Ok(Vec::new())
                }
            }
        }

        async fn close(&mut self) -> Result<(), BusError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn record(key: Option<&str>, value: Option<&str>, offset: i64) -> Record {
        Record {
            key: key.map(str::to_string),
            value: value.map(|v| v.as_bytes().to_vec()),
            topic: "app-global-topic".to_string(),
            partition: 0,
            offset,
        }
    }

    fn greet(text: &str, offset: i64) -> Record {
        record(
            Some("Greet"),
            Some(&format!(r#"{{"text":"{}"}}"#, text)),
            offset,
        )
    }

    fn dispatcher_with(registry: HandlerRegistry) -> RecordDispatcher {
        RecordDispatcher::new(Arc::new(registry), Duration::from_millis(200))
    }

    fn fast_config() -> DispatchLoopConfig {
        DispatchLoopConfig::default().with_poll_timeout(Duration::from_millis(20))
    }

    async fn wait_for_stop(metrics: &DispatchMetrics) {
        for _ in 0..200 {
            if metrics.state() == LoopState::Stopped {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("dispatch loop did not stop");
    }

    #[tokio::test]
    async fn tombstones_are_skipped() {
        let registry = HandlerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register(recorder.clone());
        let dispatcher = dispatcher_with(registry);

        assert_eq!(
            dispatcher.process_record(&record(Some("Greet"), None, 0)).await,
            RecordOutcome::Tombstone
        );
        assert_eq!(
            dispatcher.process_record(&record(Some("Greet"), Some("  "), 1)).await,
            RecordOutcome::Tombstone
        );
        assert!(recorder.seen.lock().unwrap().is_empty());
        assert_eq!(dispatcher.metrics().snapshot().tombstones, 2);
    }

    #[tokio::test]
    async fn malformed_json_is_dropped() {
        let registry = HandlerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register(recorder.clone());
        let dispatcher = dispatcher_with(registry);

        let outcome = dispatcher
            .process_record(&record(Some("Greet"), Some("{not json"), 0))
            .await;

        assert_eq!(outcome, RecordOutcome::Malformed);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_and_missing_keys_are_unhandled() {
        let dispatcher = dispatcher_with(HandlerRegistry::new());

        assert_eq!(
            dispatcher.process_record(&greet("hi", 0)).await,
            RecordOutcome::Unhandled
        );
        assert_eq!(
            dispatcher.process_record(&record(None, Some("{}"), 1)).await,
            RecordOutcome::Unhandled
        );
    }

    #[tokio::test]
    async fn failing_handlers_do_not_affect_siblings() {
        let registry = HandlerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register(Arc::new(Failing));
        registry.register(Arc::new(Panicking));
        registry.register(recorder.clone());
        let dispatcher = dispatcher_with(registry);

        let outcome = dispatcher.process_record(&greet("hello", 0)).await;

        assert_eq!(
            outcome,
            RecordOutcome::Dispatched {
                succeeded: 1,
                failed: 2
            }
        );
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn slow_handler_is_cut_off_at_timeout() {
        let registry = HandlerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register(Arc::new(Sleeping));
        registry.register(recorder.clone());
        let dispatcher =
            RecordDispatcher::new(Arc::new(registry), Duration::from_millis(50));

        let outcome = dispatcher.process_record(&greet("late", 0)).await;

        assert_eq!(
            outcome,
            RecordOutcome::Dispatched {
                succeeded: 1,
                failed: 1
            }
        );
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["late".to_string()]);
    }

    #[tokio::test]
    async fn payload_mismatch_fails_only_that_handler() {
        let registry = HandlerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register(recorder.clone());
        let dispatcher = dispatcher_with(registry);

        let outcome = dispatcher
            .process_record(&record(Some("Greet"), Some(r#"{"other":1}"#), 0))
            .await;

        assert_eq!(
            outcome,
            RecordOutcome::Dispatched {
                succeeded: 0,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn run_survives_poll_failures_and_bad_records() {
        let registry = Arc::new(HandlerRegistry::new());
        let recorder = Arc::new(Recorder::default());
        registry.register(recorder.clone());

        let (consumer, closed) = ScriptedConsumer::new(vec![
            Err(BusError::Transport("broker hiccup".into())),
            Ok(vec![
                record(Some("Greet"), Some("garbage"), 0),
                record(Some("Greet"), None, 1),
                greet("first", 2),
            ]),
            Err(BusError::Transport("again".into())),
            Ok(vec![greet("second", 3)]),
        ]);

        let dispatch = DispatchLoop::new(Box::new(consumer), registry, fast_config());
        let metrics = dispatch.metrics();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatch.run(shutdown_rx));

        for _ in 0..200 {
            if recorder.seen.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.poll_failures, 2);
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.tombstones, 1);
        assert!(*closed.lock().unwrap());
        assert_eq!(metrics.state(), LoopState::Stopped);
    }

    /// Consumer whose poll fails immediately, every time.
    struct BrokenConsumer;

    #[async_trait]
    impl LogConsumer for BrokenConsumer {
        async fn poll(&mut self, _: Duration) -> Result<Vec<Record>, BusError> {
            Err(BusError::Transport("broker down".into()))
        }

        async fn close(&mut self) -> Result<(), BusError> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failing_polls_do_not_block_shutdown() {
        let dispatch = DispatchLoop::new(
            Box::new(BrokenConsumer),
            Arc::new(HandlerRegistry::new()),
            fast_config(),
        );
        let metrics = dispatch.metrics();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatch.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatch loop did not stop")
            .unwrap();

        assert_eq!(metrics.state(), LoopState::Stopped);
        let failures = metrics.snapshot().poll_failures;
        assert!(failures >= 1, "expected poll failures, got {}", failures);
        assert!(failures < 10, "poll failures were not backed off: {}", failures);
    }

    #[tokio::test]
    async fn run_exits_when_sender_is_dropped() {
        let (consumer, closed) = ScriptedConsumer::new(Vec::new());
        let dispatch = DispatchLoop::new(
            Box::new(consumer),
            Arc::new(HandlerRegistry::new()),
            fast_config(),
        );
        let metrics = dispatch.metrics();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatch.run(shutdown_rx));

        drop(shutdown_tx);
        wait_for_stop(&metrics).await;
        handle.await.unwrap();

        assert!(*closed.lock().unwrap());
    }

    async fn run_batch_with_stop_midway(policy: ShutdownPolicy) -> Vec<String> {
        let registry = Arc::new(HandlerRegistry::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stopper = Arc::new(Stopper {
            shutdown: shutdown_tx,
            seen: Mutex::new(Vec::new()),
        });
        registry.register(stopper.clone());

        let (consumer, _closed) = ScriptedConsumer::new(vec![Ok(vec![
            greet("one", 0),
            greet("two", 1),
            greet("three", 2),
        ])]);
        let dispatch = DispatchLoop::new(
            Box::new(consumer),
            registry,
            fast_config().with_shutdown(policy),
        );
        let metrics = dispatch.metrics();

        dispatch.run(shutdown_rx).await;
        assert_eq!(metrics.state(), LoopState::Stopped);

        let seen = stopper.seen.lock().unwrap().clone();
        seen
    }

    #[tokio::test]
    async fn drop_policy_abandons_rest_of_batch() {
        let seen = run_batch_with_stop_midway(ShutdownPolicy::Drop).await;
        assert_eq!(seen, vec!["one".to_string()]);
    }

    #[tokio::test]
    async fn drain_policy_finishes_fetched_batch() {
        let seen = run_batch_with_stop_midway(ShutdownPolicy::Drain).await;
        assert_eq!(
            seen,
            vec!["one".to_string(), "two".to_string(), "three".to_string()]
        );
    }

    #[test]
    fn loop_config_from_app_config() {
        let broker = BrokerConfig {
            poll_timeout_ms: 250,
            ..BrokerConfig::default()
        };
        let dispatch = DispatchConfig {
            handler_timeout_ms: 1500,
            shutdown: ShutdownPolicy::Drain,
        };

        let config = DispatchLoopConfig::from_config(&broker, &dispatch);

        assert_eq!(config.poll_timeout, Duration::from_millis(250));
        assert_eq!(config.handler_timeout, Duration::from_millis(1500));
        assert_eq!(config.shutdown, ShutdownPolicy::Drain);
    }

    #[test]
    fn panic_messages_are_extracted() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u32), "non-string panic payload");
    }
}
