//! Read-through helper shared by the catalog and promo services.
//!
//! Cache probe failures and undecodable entries degrade to a miss: the
//! source of truth is always able to serve the read, and a flapping cache
//! must not take reads down with it. Repopulation failures are likewise
//! non-fatal. Only explicit invalidation on the write paths treats cache
//! errors as fatal, because acknowledging a write with a stale entry still
//! live would break the freshness invariant.

use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::application::error::AppError;
use crate::cache::{CacheKey, CacheStore};

pub(crate) async fn read_through<T, F, Fut>(
    cache: &dyn CacheStore,
    key: CacheKey,
    ttl: Duration,
    load: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match cache.get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                counter!("vetrina_cache_hit_total", "key" => key.namespace()).increment(1);
                return Ok(value);
            }
            Err(err) => {
                warn!(key = %key, error = %err, "cached entry undecodable, treating as miss");
            }
        },
        Ok(None) => {}
        Err(err) => {
            warn!(key = %key, error = %err, "cache probe failed, falling through to store");
        }
    }
    counter!("vetrina_cache_miss_total", "key" => key.namespace()).increment(1);

    let value = load().await?;

    match serde_json::to_string(&value) {
        Ok(serialized) => {
            if let Err(err) = cache.set(&key, &serialized, ttl).await {
                warn!(key = %key, error = %err, "cache repopulation failed");
            }
        }
        Err(err) => {
            warn!(key = %key, error = %err, "value not serializable for cache");
        }
    }

    Ok(value)
}

/// Evict a key before a write is acknowledged; failures propagate.
pub(crate) async fn invalidate(cache: &dyn CacheStore, key: CacheKey) -> Result<(), AppError> {
    cache.delete(&key).await?;
    Ok(())
}
