//! CacheStore port - Interface for the key/value cache handlers write to.
//!
//! Keys follow the `"<entity>:#<id>"` convention (see
//! `adapters::cache::person_key`). Values are stored as JSON text.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors from cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache key cannot be empty")]
    EmptyKey,

    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        DomainError::new(ErrorCode::CacheError, err.to_string())
    }
}

/// Port for a string-valued key/value cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Fails with [`CacheError::EmptyKey`] for blank keys.
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Fetch the value under `key`; missing and empty values are `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove `key`. Blank keys are ignored.
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key in the cache's database.
    async fn clear_all(&self) -> Result<(), CacheError>;
}

/// Typed JSON helpers on top of [`CacheStore`].
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Serialize `value` as JSON and store it under `key`.
    async fn cache<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, json).await
    }

    /// Fetch and decode the value under `key`.
    ///
    /// A value that no longer decodes as `T` is logged and reported as
    /// absent so callers fall back to the source of truth.
    async fn get_as<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        let Some(json) = self.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize cached value");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<C: CacheStore + ?Sized> CacheStoreExt for C {}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn CacheStore) {}

    #[test]
    fn converts_to_cache_domain_error() {
        let err: DomainError = CacheError::Unavailable("refused".into()).into();
        assert_eq!(err.code, ErrorCode::CacheError);
        assert!(err.message.contains("refused"));
    }

    #[test]
    fn empty_key_message() {
        assert_eq!(CacheError::EmptyKey.to_string(), "Cache key cannot be empty");
    }
}
