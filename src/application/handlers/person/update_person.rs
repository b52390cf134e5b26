//! UpdatePersonHandler - refreshes cached persons.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::cache::person_key;
use crate::domain::foundation::DomainError;
use crate::domain::person::{UpdatePersonData, UPDATE_PERSON_EVENT};
use crate::ports::{CacheStore, CacheStoreExt, EventConsumer};

/// Handles `UpdatePersonEvent` by overwriting the entry for the person's id.
pub struct UpdatePersonHandler {
    cache: Arc<dyn CacheStore>,
}

impl UpdatePersonHandler {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EventConsumer for UpdatePersonHandler {
    type Payload = UpdatePersonData;

    fn event_key(&self) -> &str {
        UPDATE_PERSON_EVENT
    }

    fn name(&self) -> &'static str {
        "UpdatePersonHandler"
    }

    async fn handle(&self, person: UpdatePersonData) -> Result<(), DomainError> {
        tracing::info!(person_id = %person.id, "Received update person request");

        self.cache.cache(&person_key(person.id), &person).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCache;
    use crate::application::handlers::person::test_support::UnavailableCache;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::person::PersonId;

    fn update(id: PersonId, age: u32) -> UpdatePersonData {
        UpdatePersonData {
            id,
            name: "John".to_string(),
            age,
        }
    }

    #[tokio::test]
    async fn overwrites_entry_for_person_id() {
        let cache = Arc::new(InMemoryCache::new());
        let handler = UpdatePersonHandler::new(cache.clone());
        let id = PersonId::new();

        handler.handle(update(id, 31)).await.unwrap();
        handler.handle(update(id, 32)).await.unwrap();

        assert_eq!(cache.keys().await, vec![person_key(id)]);
        let cached: UpdatePersonData = cache.get_as(&person_key(id)).await.unwrap().unwrap();
        assert_eq!(cached.age, 32);
    }

    #[tokio::test]
    async fn cache_failure_is_reported() {
        let handler = UpdatePersonHandler::new(Arc::new(UnavailableCache));

        let err = handler.handle(update(PersonId::new(), 1)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CacheError);
    }
}
