//! Redis-backed cache store for production deployments.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::ensure_key;
use crate::config::CacheConfig;
use crate::ports::{CacheError, CacheStore};

fn unavailable(e: redis::RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

/// [`CacheStore`] over a Redis multiplexed connection.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Open a connection to the server described by `config`.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url()).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;

        tracing::info!(host = %config.host, port = config.port, "Connected to Redis cache");
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        ensure_key(key)?;
        let mut conn = self.conn.clone();

        conn.set::<_, _, ()>(key, value).await.map_err(unavailable)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        ensure_key(key)?;
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(key).await.map_err(unavailable)?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        if key.trim().is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(key).await.map_err(unavailable)
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        redis::cmd("FLUSHDB")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_to_unreachable_server_is_unavailable() {
        let config = CacheConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
        };

        let result = RedisCache::connect(&config).await;

        assert!(matches!(result, Err(CacheError::Unavailable(_))));
    }

    // Round-trip tests need a running Redis:
    //
    // #[tokio::test]
    // #[ignore] // Run with: cargo test -- --ignored
    // async fn test_redis_cache_round_trip() {
    //     let cache = RedisCache::connect(&CacheConfig::default()).await.unwrap();
    //     cache.set("persons:#1", "{}".to_string()).await.unwrap();
    //     // ... test code
    // }
}
