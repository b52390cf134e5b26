//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the bridge and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventConsumer` - Typed handler invoked for records of one event key
//! - `LogProducer` / `ProducerFactory` - Appending records to the log
//! - `LogConsumer` - Polling records from the log
//!
//! ## Cache Ports
//!
//! - `CacheStore` - Key/value cache written by handlers

mod bus_error;
mod cache_store;
mod event_consumer;
mod log_consumer;
mod log_producer;

pub use bus_error::BusError;
pub use cache_store::{CacheError, CacheStore, CacheStoreExt};
pub use event_consumer::EventConsumer;
pub use log_consumer::LogConsumer;
pub use log_producer::{LogProducer, ProducerFactory};
