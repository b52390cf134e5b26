//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the bridge to external systems:
//! - `events` - Handler registry, dispatch loop, publishers, broker clients
//! - `cache` - Cache stores (in-memory, Redis)

pub mod cache;
pub mod events;

pub use cache::{person_key, InMemoryCache, RedisCache};
pub use events::{Bridge, BridgeBuilder, HandlerRegistry, InMemoryLog, LazyPublisher, Publisher};
