//! Cache adapters.
//!
//! - `InMemoryCache` - HashMap-backed store for tests
//! - `RedisCache` - Redis over a multiplexed connection

mod in_memory;
mod keys;
mod redis;

pub use in_memory::InMemoryCache;
pub use keys::person_key;
pub use self::redis::RedisCache;

use crate::ports::CacheError;

pub(crate) fn ensure_key(key: &str) -> Result<(), CacheError> {
    if key.trim().is_empty() {
        Err(CacheError::EmptyKey)
    } else {
        Ok(())
    }
}
