//! LazyPublisher - at most one publisher per topic, built on first use.
//!
//! Callers that may run before the broker is configured (or reachable) ask
//! for the publisher each time they need it. An unusable broker yields
//! `BusError::Unavailable` rather than a fault, so the caller can answer with
//! a "service unavailable" response.

use std::sync::{Arc, PoisonError, RwLock};

use super::publisher::Publisher;
use crate::config::BrokerConfig;
use crate::ports::{BusError, ProducerFactory};

/// Thread-safe, lazily constructed [`Publisher`] for one topic.
pub struct LazyPublisher {
    config: BrokerConfig,
    topic: String,
    factory: Arc<dyn ProducerFactory>,
    slot: RwLock<Option<Arc<Publisher>>>,
}

impl LazyPublisher {
    /// Publisher for the configured default topic.
    pub fn new(config: BrokerConfig, factory: Arc<dyn ProducerFactory>) -> Self {
        let topic = config.topic.clone();
        Self::for_topic(config, topic, factory)
    }

    pub fn for_topic(
        config: BrokerConfig,
        topic: impl Into<String>,
        factory: Arc<dyn ProducerFactory>,
    ) -> Self {
        Self {
            config,
            topic: topic.into(),
            factory,
            slot: RwLock::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The existing publisher, or a new one if none was built yet.
    ///
    /// Concurrent first calls construct exactly one publisher and all
    /// receive the same instance. A failed attempt leaves the slot empty, so
    /// a later call tries again.
    ///
    /// # Errors
    ///
    /// `BusError::Unavailable` if no broker address is configured or the
    /// producer cannot be built.
    pub fn get_or_create(&self) -> Result<Arc<Publisher>, BusError> {
        if let Some(publisher) = self.current() {
            return Ok(publisher);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(publisher) = slot.as_ref() {
            return Ok(Arc::clone(publisher));
        }

        if !self.config.has_address() {
            tracing::warn!(topic = %self.topic, "Broker address not configured, publisher unavailable");
            return Err(BusError::Unavailable(
                "broker address not configured".to_string(),
            ));
        }

        let producer = self.factory.create(&self.config).map_err(|e| {
            tracing::warn!(topic = %self.topic, error = %e, "Failed to create producer");
            BusError::Unavailable(e.to_string())
        })?;
        let publisher = Arc::new(Publisher::new(
            self.topic.clone(),
            producer,
            self.config.close_timeout(),
        )?);

        tracing::info!(
            topic = %self.topic,
            address = %self.config.address,
            "Publisher created"
        );
        *slot = Some(Arc::clone(&publisher));
        Ok(publisher)
    }

    /// The publisher if one has been built, without building it.
    pub fn current(&self) -> Option<Arc<Publisher>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Close and forget the publisher, if any.
    ///
    /// Failures are logged, never returned; closing twice is harmless.
    pub async fn close(&self) {
        let taken = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(publisher) = taken {
            if let Err(e) = publisher.close().await {
                tracing::warn!(topic = %self.topic, error = %e, "Failed to close publisher");
            }
        }
    }
}
