//! HandlerRegistry - event key to handler routing table.
//!
//! Readers (the dispatch loop) and writers (attach/detach at runtime) run
//! concurrently. Each key maps to an immutable handler slice; writers build
//! a new slice and swap it in, so a lookup returns a snapshot that later
//! mutations never touch.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::type_resolver::{HandlerId, RegisteredHandler, TypeResolver};
use crate::ports::EventConsumer;

type HandlerList = Arc<[RegisteredHandler]>;

/// Routing table from event key to the handlers registered for it.
///
/// Registration order within a key is preserved; the same handler may be
/// registered under several keys and is removed from all of them by
/// [`HandlerRegistry::unregister`].
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, HandlerList>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register `consumer` under the event key it declares.
    ///
    /// Returns `false` (and logs) when that key is blank.
    pub fn register<C: EventConsumer>(&self, consumer: Arc<C>) -> bool {
        self.insert(TypeResolver::erase(consumer))
    }

    /// Register `consumer` under `event_key` instead of its declared key.
    pub fn register_as<C: EventConsumer>(&self, event_key: &str, consumer: Arc<C>) -> bool {
        self.insert(TypeResolver::erase_as(event_key, consumer))
    }

    /// Add an already resolved handler.
    pub fn insert(&self, handler: RegisteredHandler) -> bool {
        if handler.event_key().trim().is_empty() {
            tracing::warn!(
                handler = handler.name(),
                "Refusing to register handler with blank event key"
            );
            return false;
        }

        let mut handlers = self.write();
        let current = handlers
            .get(handler.event_key())
            .map(|list| list.iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        tracing::info!(
            handler = handler.name(),
            event_key = handler.event_key(),
            payload_type = %handler.payload_type(),
            "Registered event handler"
        );

        let key = handler.event_key().to_string();
        let mut next = current;
        next.push(handler);
        handlers.insert(key, next.into());
        true
    }

    /// Register an initial handler set, logging how many were accepted.
    ///
    /// Returns the number registered.
    pub fn register_all<I>(&self, handlers: I) -> usize
    where
        I: IntoIterator<Item = RegisteredHandler>,
    {
        let handlers: Vec<_> = handlers.into_iter().collect();
        tracing::info!(count = handlers.len(), "Registering event handlers");

        let registered = handlers
            .into_iter()
            .filter(|handler| self.insert(handler.clone()))
            .count();

        if registered == 0 {
            tracing::warn!("No event handlers were registered");
        } else {
            tracing::info!(count = registered, "Registered event handlers");
        }
        registered
    }

    /// Remove every registration of `consumer`, under any key.
    ///
    /// Matching is by instance identity. Returns how many entries were
    /// removed; zero if it was never registered.
    pub fn unregister<C: EventConsumer>(&self, consumer: &Arc<C>) -> usize {
        self.unregister_id(HandlerId::of(consumer))
    }

    /// Remove every registration carrying `id`.
    pub fn unregister_id(&self, id: HandlerId) -> usize {
        let mut handlers = self.write();
        let mut removed = 0;

        handlers.retain(|event_key, list| {
            let before = list.len();
            if !list.iter().any(|h| h.id() == id) {
                return true;
            }
            let kept: Vec<_> = list.iter().filter(|h| h.id() != id).cloned().collect();
            removed += before - kept.len();
            tracing::debug!(event_key = %event_key, "Unregistered event handler");
            if kept.is_empty() {
                return false;
            }
            *list = kept.into();
            true
        });

        removed
    }

    /// Snapshot of the handlers for `event_key`; empty when none.
    pub fn lookup(&self, event_key: &str) -> Arc<[RegisteredHandler]> {
        self.read()
            .get(event_key)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Total registrations across all keys.
    pub fn handler_count(&self) -> usize {
        self.read().values().map(|list| list.len()).sum()
    }

    /// Event keys with at least one handler.
    pub fn event_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, HandlerList>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, HandlerList>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("event_keys", &self.event_keys())
            .field("handler_count", &self.handler_count())
            .finish()
    }
}
