//! EventConsumer port - the handler capability invoked by the bridge.
//!
//! A consumer declares, at its own definition, which event key it listens
//! to and which payload type it expects. The bridge uses that declaration
//! to deserialize each record into the right concrete type before calling
//! [`EventConsumer::handle`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::foundation::DomainError;

/// Handler for one kind of event arriving from the log.
///
/// Implementations should be:
/// - **Idempotent** - delivery is at-least-once, so records may repeat
/// - **Bounded** - a slow handler delays every record behind it; the bridge
///   cuts it off after the configured handler timeout
/// - **Self-contained** - an error or panic is logged and isolated, it is
///   never retried
///
/// # Example
///
/// ```ignore
/// struct AuditHandler;
///
/// #[async_trait]
/// impl EventConsumer for AuditHandler {
///     type Payload = serde_json::Value;
///
///     fn event_key(&self) -> &str {
///         "CreatePersonEvent"
///     }
///
///     async fn handle(&self, payload: serde_json::Value) -> Result<(), DomainError> {
///         tracing::info!(%payload, "audit");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EventConsumer: Send + Sync + 'static {
    /// The shape this handler expects the record value to have.
    ///
    /// Use `serde_json::Value` to receive the parsed JSON untyped.
    type Payload: DeserializeOwned + Send + 'static;

    /// Event key this handler is registered under.
    ///
    /// A blank key is a configuration mistake; registration is refused and
    /// logged instead of failing startup.
    fn event_key(&self) -> &str;

    /// Handler name for logging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Process one deserialized payload.
    async fn handle(&self, payload: Self::Payload) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    #[async_trait]
    impl EventConsumer for Named {
        type Payload = serde_json::Value;

        fn event_key(&self) -> &str {
            "Named"
        }

        async fn handle(&self, _: serde_json::Value) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[test]
    fn default_name_is_type_path() {
        assert!(Named.name().ends_with("Named"));
    }

    #[test]
    fn event_consumer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Named>();
    }
}
