//! In-memory cache implementation using moka

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::DomainError;
use crate::domain::cache::{Cache, Clock, KeyPattern, SystemClock};

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on any entry's lifetime; per-entry TTLs above it are cut short
    pub max_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(2 * 24 * 3600),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch, per the cache clock)
    expires_at: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-memory cache implementation using moka
///
/// Features:
/// - Per-entry TTL checked lazily on read against an injectable clock
/// - Capacity-bounded eviction
/// - Glob deletes over a snapshot of the key set
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: InMemoryCacheConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache whose expiry is driven by the given clock
    pub fn with_clock(config: InMemoryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.max_ttl)
            .build();

        Self {
            cache,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    async fn matching_keys<F>(&self, predicate: F) -> Result<Vec<String>, DomainError>
    where
        F: Fn(&str, &CacheEntry) -> bool + Send + 'static,
    {
        self.cache.run_pending_tasks().await;

        // Iterating moka is synchronous; keep it off the async workers
        let snapshot = self.cache.clone();
        tokio::task::spawn_blocking(move || {
            snapshot
                .iter()
                .filter(|(k, entry)| predicate(k.as_str(), entry))
                .map(|(k, _)| k.as_str().to_string())
                .collect::<Vec<String>>()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) => {
                if entry.is_expired(self.clock.now_millis()) {
                    self.cache.remove(key).await;
                    return Ok(None);
                }

                Ok(Some(entry.data))
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let ttl = ttl.min(self.config.max_ttl);
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: self.clock.now_millis() + ttl.as_millis() as u64,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let now = self.clock.now_millis();
        Ok(self
            .cache
            .remove(key)
            .await
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
        if pattern.is_exact() {
            return Ok(usize::from(self.delete(pattern.as_str()).await?));
        }

        let regex = pattern.to_regex()?;
        let now = self.clock.now_millis();
        let keys = self
            .matching_keys(move |key, entry| !entry.is_expired(now) && regex.is_match(key))
            .await?;

        let mut deleted = 0;
        for key in keys {
            if self.cache.remove(&key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        let now = self.clock.now_millis();
        Ok(self
            .matching_keys(move |_, entry| !entry.is_expired(now))
            .await?
            .len())
    }

    async fn purge_expired(&self) -> Result<usize, DomainError> {
        let now = self.clock.now_millis();
        let keys = self
            .matching_keys(move |_, entry| entry.is_expired(now))
            .await?;

        let count = keys.len();
        for key in keys {
            self.cache.remove(&key).await;
        }

        Ok(count)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}
