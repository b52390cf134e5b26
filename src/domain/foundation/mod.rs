//! Foundation module - Shared domain primitives.
//!
//! Contains the event vocabulary (keys, envelopes, records) and the error
//! types shared by every layer.

mod envelope;
mod errors;
mod record;

pub use envelope::{Envelope, EventKey};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use record::{ProducerRecord, Record, RecordCoordinates};
