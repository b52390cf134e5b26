//! Application layer - Event handlers.
//!
//! Handlers implement the `EventConsumer` port and orchestrate the ports
//! they depend on (the cache, for person events).

pub mod handlers;

pub use handlers::{CreatePersonHandler, DeletePersonHandler, UpdatePersonHandler};
