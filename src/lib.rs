//! Event Bridge - typed event routing over a partitioned log
//!
//! Publishers wrap payloads in keyed envelopes and append them to a shared
//! topic. On the consuming side a dispatch loop polls the topic, routes each
//! record by its event key to the handlers registered for it, and hands each
//! handler the payload decoded into the type it declared.
//!
//! The person cache service (`application::handlers::person`) is the
//! reference consumer: it keeps a Redis cache in step with person events.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::events::{Bridge, BridgeBuilder, HandlerRegistry, Publisher};
pub use domain::foundation::{DomainError, Envelope, EventKey};
pub use ports::{BusError, EventConsumer};
