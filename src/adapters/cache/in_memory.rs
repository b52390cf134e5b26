//! In-memory cache store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ensure_key;
use crate::ports::{CacheError, CacheStore};

/// HashMap-backed [`CacheStore`].
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        ensure_key(key)?;
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        ensure_key(key)?;
        let value = self.entries.read().await.get(key).cloned();
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        if key.trim().is_empty() {
            return Ok(());
        }
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
