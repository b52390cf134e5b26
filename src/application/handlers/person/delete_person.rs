//! DeletePersonHandler - evicts deleted persons from the cache.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::cache::person_key;
use crate::domain::foundation::DomainError;
use crate::domain::person::{PersonId, DELETE_PERSON_EVENT};
use crate::ports::{CacheStore, EventConsumer};

/// Handles `DeletePersonEvent`, whose payload is the bare person id.
pub struct DeletePersonHandler {
    cache: Arc<dyn CacheStore>,
}

impl DeletePersonHandler {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EventConsumer for DeletePersonHandler {
    type Payload = PersonId;

    fn event_key(&self) -> &str {
        DELETE_PERSON_EVENT
    }

    fn name(&self) -> &'static str {
        "DeletePersonHandler"
    }

    async fn handle(&self, id: PersonId) -> Result<(), DomainError> {
        tracing::info!(person_id = %id, "Received delete person request");

        self.cache.invalidate(&person_key(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCache;
    use crate::application::handlers::person::test_support::UnavailableCache;
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn invalidates_only_that_person() {
        let cache = Arc::new(InMemoryCache::new());
        let handler = DeletePersonHandler::new(cache.clone());
        let doomed = PersonId::new();
        let kept = PersonId::new();
        cache.set(&person_key(doomed), "{}".to_string()).await.unwrap();
        cache.set(&person_key(kept), "{}".to_string()).await.unwrap();

        handler.handle(doomed).await.unwrap();

        assert_eq!(cache.keys().await, vec![person_key(kept)]);
    }

    #[tokio::test]
    async fn deleting_unknown_person_succeeds() {
        let cache = Arc::new(InMemoryCache::new());
        let handler = DeletePersonHandler::new(cache);

        assert!(handler.handle(PersonId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn cache_failure_is_reported() {
        let handler = DeletePersonHandler::new(Arc::new(UnavailableCache));

        let err = handler.handle(PersonId::new()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CacheError);
    }
}
