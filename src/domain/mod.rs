//! Domain layer containing the event vocabulary and shared types.
//!
//! # Module Organization
//!
//! - `foundation` - Envelopes, event keys, log records, errors
//! - `person` - Person events and payloads

pub mod foundation;
pub mod person;
