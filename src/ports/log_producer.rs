//! LogProducer port - Interface for appending records to the shared log.
//!
//! The bridge's publisher turns envelopes into [`ProducerRecord`]s and hands
//! them to a `LogProducer` without knowing which broker sits behind it
//! (Kafka, in-memory for tests).

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::BusError;
use crate::config::BrokerConfig;
use crate::domain::foundation::{ProducerRecord, RecordCoordinates};

/// Port for appending records to a partitioned log.
///
/// Implementations must ensure:
/// - Records with the same key land in the same partition
/// - `send` resolves once the broker acknowledged (or rejected) the record
/// - `flush` is safe to call more than once
#[async_trait]
pub trait LogProducer: Send + Sync {
    /// Append one record, resolving to where it was written.
    async fn send(&self, record: ProducerRecord) -> Result<RecordCoordinates, BusError>;

    /// Wait until buffered records are delivered, up to `timeout`.
    async fn flush(&self, timeout: Duration) -> Result<(), BusError>;
}

/// Builds producer clients from broker configuration.
///
/// Construction may fail (bad address, client library error); callers turn
/// that into an absent publisher instead of a process fault.
pub trait ProducerFactory: Send + Sync {
    fn create(&self, config: &BrokerConfig) -> Result<Arc<dyn LogProducer>, BusError>;
}

impl<F> ProducerFactory for F
where
    F: Fn(&BrokerConfig) -> Result<Arc<dyn LogProducer>, BusError> + Send + Sync,
{
    fn create(&self, config: &BrokerConfig) -> Result<Arc<dyn LogProducer>, BusError> {
        self(config)
    }
}
