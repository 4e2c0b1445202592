//! In-process cache backend.
//!
//! A single TTL'd map behind an async mutex. Suitable for single-node
//! deployments and tests; the mutex makes `set_if_absent` atomic within the
//! process, which is all the coordination the visit lock and rate limiter
//! need when there is one process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CacheError, CacheKey, CacheStore};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(entry: &Entry, now: Instant) -> bool {
        entry.expires_at > now
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let rendered = key.to_string();
        let now = Instant::now();
        let mut guard = self.entries.lock().await;
        match guard.get(&rendered) {
            Some(entry) if Self::live(entry, now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                guard.remove(&rendered);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut guard = self.entries.lock().await;
        guard.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let rendered = key.to_string();
        let now = Instant::now();
        let mut guard = self.entries.lock().await;
        if guard.get(&rendered).is_some_and(|entry| Self::live(entry, now)) {
            return Ok(false);
        }
        guard.insert(
            rendered,
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut guard = self.entries.lock().await;
        guard.remove(&key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips_until_expiry() {
        let cache = InMemoryCache::new();
        let key = CacheKey::Product(1);

        cache.set(&key, "snapshot", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("snapshot"));

        cache.set(&key, "stale", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_if_absent_acquires_once_per_window() {
        let cache = InMemoryCache::new();
        let lock = CacheKey::VisitLock(9);

        assert!(cache.set_if_absent(&lock, "1", Duration::from_secs(1)).await.unwrap());
        assert!(!cache.set_if_absent(&lock, "1", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn set_if_absent_reacquires_after_expiry() {
        let cache = InMemoryCache::new();
        let lock = CacheKey::VisitLock(9);

        assert!(cache.set_if_absent(&lock, "1", Duration::from_millis(10)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(cache.set_if_absent(&lock, "1", Duration::from_millis(10)).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_live_entries() {
        let cache = InMemoryCache::new();
        let key = CacheKey::AllProducts;

        cache.set(&key, "[]", Duration::from_secs(60)).await.unwrap();
        cache.delete(&key).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }
}
