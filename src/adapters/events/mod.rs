//! Event bridge adapters.
//!
//! - `HandlerRegistry` / `TypeResolver` - Routing table of typed handlers
//! - `DispatchLoop` - Background task routing polled records to handlers
//! - `Publisher` / `LazyPublisher` - Fire-and-forget sends to a topic
//! - `Bridge` - Owns all of the above for one process
//! - `InMemoryLog` - Partitioned in-process log for tests and local runs
//! - `kafka` - rdkafka-backed producer and consumer (feature `kafka`)

mod bridge;
mod dispatch_loop;
mod in_memory_log;
mod lazy_publisher;
mod publisher;
mod registry;
mod type_resolver;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use bridge::{Bridge, BridgeBuilder};
pub use dispatch_loop::{
    DispatchLoop, DispatchLoopConfig, DispatchMetrics, LoopState, MetricsSnapshot,
    RecordDispatcher, RecordOutcome,
};
pub use in_memory_log::{InMemoryConsumer, InMemoryLog, InMemoryProducer};
pub use lazy_publisher::LazyPublisher;
pub use publisher::Publisher;
pub use registry::HandlerRegistry;
pub use type_resolver::{DispatchError, HandlerId, PayloadType, RegisteredHandler, TypeResolver};
