//! Caching layer for data API responses

use cached::{Cached, TimedCache};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for data API requests
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Operation, e.g. "search" or "snapshot"
    pub endpoint: &'static str,
    /// Subject of the request (ticker, query text, topic)
    pub subject: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(endpoint: &'static str, subject: impl Into<String>) -> Self {
        Self {
            endpoint,
            subject: subject.into(),
        }
    }
}

/// Thread-safe TTL cache shared by clones
pub struct ResponseCache<K = CacheKey, V = serde_json::Value> {
    cache: Arc<RwLock<TimedCache<K, V>>>,
}

impl<K, V> ResponseCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
{
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a live value from the cache
    pub async fn get(&self, key: &K) -> Option<V> {
        // TimedCache evicts on read, so even lookups need the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: K, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return Ok(value);
        }

        tracing::debug!("Cache miss for key: {:?}", key);
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Clone for ResponseCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache: ResponseCache<CacheKey, Vec<String>> = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("search", "infosys");

        cache.insert(key.clone(), vec!["INFY.NS".to_string()]).await;

        assert_eq!(cache.get(&key).await, Some(vec!["INFY.NS".to_string()]));
        assert_eq!(cache.get(&CacheKey::new("snapshot", "infosys")).await, None);
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache: ResponseCache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("snapshot", "TCS.NS");
        let value = serde_json::json!({"trailingPE": 30.1});

        let mut call_count = 0;
        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(value.clone()) }
            })
            .await
            .unwrap();
        assert_eq!(result, value);
        assert_eq!(call_count, 1);

        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(serde_json::json!(null)) }
            })
            .await
            .unwrap();
        assert_eq!(result, value);
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: ResponseCache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("snapshot", "BAD");

        let err = cache
            .get_or_fetch(key.clone(), || async { Err::<serde_json::Value, _>("boom") })
            .await;
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_cache_clear() {
        tokio_test::block_on(async {
            let cache: ResponseCache = ResponseCache::new(Duration::from_secs(60));
            for i in 0..5 {
                cache
                    .insert(CacheKey::new("search", format!("q{i}")), serde_json::json!(i))
                    .await;
            }
            assert_eq!(cache.len().await, 5);

            cache.clear().await;
            assert!(cache.is_empty().await);
        });
    }
}
