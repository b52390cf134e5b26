//! Bridge - one process's connection to the event log.
//!
//! Owns the handler registry, the dispatch loop task and the per-topic
//! publishers. Handlers may be attached or detached while the loop runs;
//! the change applies from the next record dispatched.
//!
//! # Example
//!
//! ```ignore
//! let bridge = Bridge::builder(config.broker.clone(), config.dispatch.clone())
//!     .consumer(Box::new(KafkaLogConsumer::new(&config.broker)?))
//!     .producer_factory(Arc::new(KafkaProducerFactory))
//!     .handler(Arc::new(CreatePersonHandler::new(cache.clone())))
//!     .build();
//!
//! bridge.start()?;
//! bridge.publisher()?.send(&create_person_event(data))?;
//! bridge.close().await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::dispatch_loop::{DispatchLoop, DispatchLoopConfig, DispatchMetrics, LoopState};
use super::lazy_publisher::LazyPublisher;
use super::publisher::Publisher;
use super::registry::HandlerRegistry;
use super::type_resolver::{RegisteredHandler, TypeResolver};
use crate::config::{BrokerConfig, DispatchConfig};
use crate::ports::{BusError, EventConsumer, LogConsumer, ProducerFactory};

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    broker: BrokerConfig,
    dispatch: DispatchConfig,
    consumer: Option<Box<dyn LogConsumer>>,
    producer_factory: Option<Arc<dyn ProducerFactory>>,
    handlers: Vec<RegisteredHandler>,
}

impl BridgeBuilder {
    /// Consumer the dispatch loop polls. Without one, `start` fails.
    pub fn consumer(mut self, consumer: Box<dyn LogConsumer>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Factory for publisher clients. Without one, publishers are unavailable.
    pub fn producer_factory(mut self, factory: Arc<dyn ProducerFactory>) -> Self {
        self.producer_factory = Some(factory);
        self
    }

    /// Add a handler to the initial set.
    pub fn handler<C: EventConsumer>(mut self, consumer: Arc<C>) -> Self {
        self.handlers.push(TypeResolver::erase(consumer));
        self
    }

    pub fn build(self) -> Bridge {
        let registry = Arc::new(HandlerRegistry::new());
        registry.register_all(self.handlers);

        Bridge {
            broker: self.broker,
            dispatch: self.dispatch,
            registry,
            producer_factory: self.producer_factory,
            publishers: Mutex::new(Some(HashMap::new())),
            consumer: Mutex::new(self.consumer),
            started: AtomicBool::new(false),
            running: Mutex::new(None),
            metrics: Arc::new(DispatchMetrics::default()),
        }
    }
}

/// Event bridge for one process.
pub struct Bridge {
    broker: BrokerConfig,
    dispatch: DispatchConfig,
    registry: Arc<HandlerRegistry>,
    producer_factory: Option<Arc<dyn ProducerFactory>>,
    /// `None` once the bridge is closed.
    publishers: Mutex<Option<HashMap<String, Arc<LazyPublisher>>>>,
    consumer: Mutex<Option<Box<dyn LogConsumer>>>,
    started: AtomicBool,
    running: Mutex<Option<RunningLoop>>,
    metrics: Arc<DispatchMetrics>,
}

impl Bridge {
    pub fn builder(broker: BrokerConfig, dispatch: DispatchConfig) -> BridgeBuilder {
        BridgeBuilder {
            broker,
            dispatch,
            consumer: None,
            producer_factory: None,
            handlers: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Counters and state of the dispatch loop.
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Spawn the dispatch loop on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// - `AlreadyStarted` on any call after the first successful one
    /// - `Unavailable` if no consumer was configured or there is no runtime
    pub fn start(&self) -> Result<(), BusError> {
        let runtime = Handle::try_current()
            .map_err(|e| BusError::Unavailable(format!("no async runtime: {}", e)))?;

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BusError::AlreadyStarted);
        }

        let Some(consumer) = lock(&self.consumer).take() else {
            self.started.store(false, Ordering::SeqCst);
            return Err(BusError::Unavailable("no log consumer configured".to_string()));
        };

        let config = DispatchLoopConfig::from_config(&self.broker, &self.dispatch);
        let dispatch = DispatchLoop::new(consumer, Arc::clone(&self.registry), config)
            .with_metrics(Arc::clone(&self.metrics));

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(dispatch.run(shutdown_rx));
        *lock(&self.running) = Some(RunningLoop { shutdown, task });

        tracing::info!(
            topic = %self.broker.topic,
            group_id = %self.broker.group_id,
            handlers = self.registry.handler_count(),
            "Event bridge started"
        );
        Ok(())
    }

    /// True while the dispatch loop task is alive.
    pub fn is_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .map(|running| !running.task.is_finished())
            .unwrap_or(false)
    }

    pub fn state(&self) -> LoopState {
        self.metrics.state()
    }

    /// Signal the dispatch loop to stop and wait for it to exit.
    ///
    /// Idempotent; a bridge that was never started stops trivially.
    pub async fn stop(&self) -> Result<(), BusError> {
        let Some(running) = lock(&self.running).take() else {
            return Ok(());
        };

        let _ = running.shutdown.send(true);
        running.task.await.map_err(|e| {
            tracing::error!(error = %e, "Dispatch loop task failed");
            BusError::Join(e.to_string())
        })?;

        tracing::info!("Event bridge stopped");
        Ok(())
    }

    /// Stop the loop and close every publisher. Never fails.
    ///
    /// Publishers cannot be acquired afterwards.
    pub async fn close(&self) {
        if let Err(e) = self.stop().await {
            tracing::warn!(error = %e, "Error while stopping dispatch loop");
        }

        let publishers = lock(&self.publishers).take().unwrap_or_default();
        for (_, publisher) in publishers {
            publisher.close().await;
        }
    }

    /// Register an additional handler under the key it declares.
    pub fn attach_handler<C: EventConsumer>(&self, consumer: Arc<C>) -> bool {
        self.registry.register(consumer)
    }

    /// Remove every registration of `consumer`; returns how many.
    pub fn detach_handler<C: EventConsumer>(&self, consumer: &Arc<C>) -> usize {
        self.registry.unregister(consumer)
    }

    /// Publisher for the configured default topic.
    pub fn publisher(&self) -> Result<Arc<Publisher>, BusError> {
        self.publisher_for(&self.broker.topic)
    }

    /// Publisher for `topic`, created on first use.
    ///
    /// # Errors
    ///
    /// - `Closed` after [`Bridge::close`]
    /// - `Unavailable` when no producer factory was configured, no broker
    ///   address is set, or the producer cannot be built
    pub fn publisher_for(&self, topic: &str) -> Result<Arc<Publisher>, BusError> {
        let Some(factory) = self.producer_factory.as_ref() else {
            return Err(BusError::Unavailable(
                "no producer factory configured".to_string(),
            ));
        };

        let lazy = {
            let mut guard = lock(&self.publishers);
            let Some(publishers) = guard.as_mut() else {
                return Err(BusError::Closed);
            };
            Arc::clone(publishers.entry(topic.to_string()).or_insert_with(|| {
                Arc::new(LazyPublisher::for_topic(
                    self.broker.clone(),
                    topic,
                    Arc::clone(factory),
                ))
            }))
        };
        lazy.get_or_create()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some(running) = lock(&self.running).take() {
            let _ = running.shutdown.send(true);
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("topic", &self.broker.topic)
            .field("group_id", &self.broker.group_id)
            .field("registry", &self.registry)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
