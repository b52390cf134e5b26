//! Event keys and envelopes - the producing side's unit of an event.
//!
//! An [`Envelope`] pairs an [`EventKey`] with a payload before it is
//! serialized. The key is both the log partitioning key and the routing key
//! used to find handlers on the consuming side.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Logical name of an event type (e.g. `"CreatePersonEvent"`).
///
/// Always non-blank. Constructed through [`EventKey::new`], which validates,
/// or [`EventKey::from_static`] for compile-time constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventKey(String);

impl EventKey {
    /// Creates an event key, rejecting empty or whitespace-only names.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::empty_field("event_key"));
        }
        Ok(Self(key))
    }

    /// Creates an event key from a constant.
    ///
    /// Intended for the event-name constants of a domain module; a blank
    /// constant is a programming error caught in debug builds.
    pub fn from_static(key: &'static str) -> Self {
        debug_assert!(!key.trim().is_empty(), "event key constants must not be blank");
        Self(key.to_string())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EventKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventKey> for String {
    fn from(key: EventKey) -> Self {
        key.0
    }
}

impl AsRef<str> for EventKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An event ready to be published: a key plus an in-memory payload.
///
/// The key is fixed at construction; there is no setter. The payload is
/// JSON-encoded only when the envelope is handed to a publisher.
///
/// # Example
///
/// ```
/// use event_bridge::domain::foundation::Envelope;
/// use serde_json::json;
///
/// let envelope = Envelope::new("CreatePersonEvent", json!({"name": "John", "age": 31})).unwrap();
/// assert_eq!(envelope.event_key().as_str(), "CreatePersonEvent");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    event_key: EventKey,
    payload: T,
}

impl<T> Envelope<T> {
    /// Creates an envelope, validating the event name.
    pub fn new(event_key: impl Into<String>, payload: T) -> Result<Self, ValidationError> {
        Ok(Self::with_key(EventKey::new(event_key)?, payload))
    }

    /// Creates an envelope from an already-validated key.
    pub fn with_key(event_key: EventKey, payload: T) -> Self {
        Self { event_key, payload }
    }

    /// The routing and partitioning key.
    pub fn event_key(&self) -> &EventKey {
        &self.event_key
    }

    /// The payload carried by this envelope.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Splits the envelope into its key and payload.
    pub fn into_parts(self) -> (EventKey, T) {
        (self.event_key, self.payload)
    }
}
