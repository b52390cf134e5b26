//! TypeResolver - binds each handler to the payload type it declared.
//!
//! Handlers are registered as typed [`EventConsumer`]s. Resolution happens
//! once, at registration: the consumer is wrapped in a [`RegisteredHandler`]
//! whose deserializer is monomorphized for `C::Payload`, so dispatch never
//! inspects types at runtime.
//!
//! ```text
//! Arc<CreatePersonHandler>            RegisteredHandler
//!   Payload = CreatePersonData  ──►     payload_type: Typed("CreatePersonData")
//!   event_key = "CreatePersonEvent"     dispatch(&Value) = from_value + handle
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::ports::EventConsumer;

/// Descriptor of the payload type a handler expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    /// A concrete type; `type_name` is for diagnostics only.
    Typed { type_name: &'static str },
    /// The handler takes the parsed JSON as-is.
    UntypedJson,
}

impl PayloadType {
    /// Descriptor for `T`; `serde_json::Value` maps to the untyped fallback.
    pub fn of<T: 'static>() -> Self {
        if TypeId::of::<T>() == TypeId::of::<JsonValue>() {
            PayloadType::UntypedJson
        } else {
            PayloadType::Typed {
                type_name: type_name::<T>(),
            }
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadType::Typed { type_name } => f.write_str(type_name),
            PayloadType::UntypedJson => f.write_str("json"),
        }
    }
}

/// Why a single handler invocation did not succeed.
///
/// Every variant is isolated to the one handler; siblings and later records
/// are unaffected.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("payload does not match {expected}: {source}")]
    Payload {
        expected: PayloadType,
        #[source]
        source: serde_json::Error,
    },

    #[error("handler failed: {0}")]
    Handler(#[from] DomainError),

    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Identity of a registered handler instance.
///
/// Two registrations share an id exactly when they wrap the same `Arc`;
/// value equality of handlers plays no part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    pub fn of<C: EventConsumer>(consumer: &Arc<C>) -> Self {
        Self(Arc::as_ptr(consumer) as *const () as usize)
    }
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn dispatch(&self, payload: &JsonValue) -> Result<(), DispatchError>;
}

struct TypedHandler<C: EventConsumer> {
    consumer: Arc<C>,
}

#[async_trait]
impl<C: EventConsumer> ErasedHandler for TypedHandler<C> {
    async fn dispatch(&self, payload: &JsonValue) -> Result<(), DispatchError> {
        let typed = C::Payload::deserialize(payload).map_err(|source| DispatchError::Payload {
            expected: PayloadType::of::<C::Payload>(),
            source,
        })?;
        self.consumer.handle(typed).await?;
        Ok(())
    }
}

/// A handler after type resolution, ready to be stored in the registry.
#[derive(Clone)]
pub struct RegisteredHandler {
    id: HandlerId,
    event_key: String,
    name: &'static str,
    payload_type: PayloadType,
    inner: Arc<dyn ErasedHandler>,
}

impl RegisteredHandler {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Event key the handler was registered under.
    pub fn event_key(&self) -> &str {
        &self.event_key
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    /// Deserialize `payload` into this handler's type and invoke it.
    ///
    /// Each call decodes independently; handlers sharing a key may expect
    /// different shapes.
    pub async fn dispatch(&self, payload: &JsonValue) -> Result<(), DispatchError> {
        self.inner.dispatch(payload).await
    }
}

impl fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("id", &self.id)
            .field("event_key", &self.event_key)
            .field("name", &self.name)
            .field("payload_type", &self.payload_type)
            .finish_non_exhaustive()
    }
}

/// Resolves handlers to their payload types.
pub struct TypeResolver;

impl TypeResolver {
    /// The payload type `consumer` declared.
    pub fn resolve<C: EventConsumer>(_consumer: &C) -> PayloadType {
        PayloadType::of::<C::Payload>()
    }

    /// Wrap `consumer` under the event key it declares.
    pub fn erase<C: EventConsumer>(consumer: Arc<C>) -> RegisteredHandler {
        let event_key = consumer.event_key().to_string();
        Self::erase_as(event_key, consumer)
    }

    /// Wrap `consumer` under an explicitly chosen event key.
    pub fn erase_as<C: EventConsumer>(
        event_key: impl Into<String>,
        consumer: Arc<C>,
    ) -> RegisteredHandler {
        RegisteredHandler {
            id: HandlerId::of(&consumer),
            event_key: event_key.into(),
            name: consumer.name(),
            payload_type: Self::resolve(consumer.as_ref()),
            inner: Arc::new(TypedHandler { consumer }),
        }
    }
}
