//! Cache layer contract.
//!
//! Entries are never authoritative: any key may expire or vanish at any time
//! without breaking correctness (cache-aside law). The one
//! concurrency-critical operation is [`CacheStore::set_if_absent`], which
//! must be atomic at the protocol level because it backs the visit lock and
//! the favorite rate limiter.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod keys;
pub mod memory;

pub use keys::CacheKey;
pub use memory::InMemoryCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cached value could not be decoded: {0}")]
    Decode(String),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Store `value` only if `key` currently has no live value. Returns
    /// whether the write happened. Must be atomic; read-then-write
    /// implementations are not acceptable backends.
    async fn set_if_absent(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError>;
}
