//! Errors raised by broker clients and the bridge around them.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Errors on the publish and poll paths.
#[derive(Debug, Error)]
pub enum BusError {
    /// No usable broker client: missing configuration or construction failed.
    #[error("Event bus unavailable: {0}")]
    Unavailable(String),

    /// The broker could not be reached or rejected the request.
    #[error("Broker transport error: {0}")]
    Transport(String),

    /// The client was closed before the call.
    #[error("Broker client is closed")]
    Closed,

    /// The payload could not be encoded as JSON.
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The event name was blank.
    #[error("Invalid event key: {0}")]
    InvalidEventKey(#[from] ValidationError),

    /// `start()` was called on a bridge that already owns a running loop.
    #[error("Dispatch loop already started")]
    AlreadyStarted,

    /// The dispatch task ended abnormally.
    #[error("Dispatch task failed: {0}")]
    Join(String),
}

impl BusError {
    /// True for the "bus unavailable" class callers map to a distinct
    /// service-unavailable response.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BusError::Unavailable(_))
    }
}
