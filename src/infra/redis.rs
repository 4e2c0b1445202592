//! Redis cache backend.
//!
//! `set_if_absent` rides on `SET NX EX`, which Redis applies atomically at
//! the protocol level. The visit lock and the favorite rate limiter depend
//! on that atomicity.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ExistenceCheck, SetExpiry, SetOptions};

use crate::cache::{CacheError, CacheKey, CacheStore};

const CONNECTION_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(CONNECTION_TIMEOUT);

        let client = Client::open(redis_url).map_err(CacheError::backend)?;
        let manager = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(CacheError::backend)?;

        Ok(Self { manager })
    }

    fn ttl_secs(ttl: Duration) -> u64 {
        // Redis EX takes whole seconds; never round a positive TTL to zero.
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get(key.to_string()).await.map_err(CacheError::backend)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.set_ex(key.to_string(), value, Self::ttl_secs(ttl))
            .await
            .map_err(CacheError::backend)
    }

    async fn set_if_absent(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(Self::ttl_secs(ttl)));

        let mut conn = self.manager.clone();
        let reply: Option<String> = conn
            .set_options(key.to_string(), value, options)
            .await
            .map_err(CacheError::backend)?;

        // SET NX replies OK when the key was written and Nil when it was
        // already present.
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.del(key.to_string()).await.map_err(CacheError::backend)
    }
}
