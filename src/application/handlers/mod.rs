//! Application handlers.
//!
//! Event handlers registered with the bridge.

pub mod person;

pub use person::{CreatePersonHandler, DeletePersonHandler, UpdatePersonHandler};
