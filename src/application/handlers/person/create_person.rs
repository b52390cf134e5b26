//! CreatePersonHandler - caches newly created persons.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::cache::person_key;
use crate::domain::foundation::DomainError;
use crate::domain::person::{CreatePersonData, PersonId, CREATE_PERSON_EVENT};
use crate::ports::{CacheStore, CacheStoreExt, EventConsumer};

/// Handles `CreatePersonEvent` by caching the person under a fresh id.
///
/// The create payload carries no id, so each delivery allocates a new one;
/// a redelivered record produces a second cache entry.
pub struct CreatePersonHandler {
    cache: Arc<dyn CacheStore>,
}

impl CreatePersonHandler {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EventConsumer for CreatePersonHandler {
    type Payload = CreatePersonData;

    fn event_key(&self) -> &str {
        CREATE_PERSON_EVENT
    }

    fn name(&self) -> &'static str {
        "CreatePersonHandler"
    }

    async fn handle(&self, person: CreatePersonData) -> Result<(), DomainError> {
        let id = PersonId::new();
        tracing::info!(person_id = %id, name = %person.name, "Received create person request");

        self.cache.cache(&person_key(id), &person).await?;
        Ok(())
    }
}
