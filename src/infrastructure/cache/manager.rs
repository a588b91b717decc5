//! Fail-open front for the cache backend
//!
//! Route handlers and repositories talk to the cache only through
//! [`CacheManager`]. Every backend call is bounded by a timeout, and any
//! failure is logged and counted, then absorbed: reads degrade to a miss,
//! writes and invalidations degrade to a no-op.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::DomainError;
use crate::domain::cache::{Cache, CacheStats, KeyPattern};
use crate::infrastructure::observability::{
    LookupOutcome, record_cache_error, record_cache_invalidation, record_cache_lookup,
    record_cache_size,
};

use super::factory::CacheConfig;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    invalidations: AtomicU64,
    keys_invalidated: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.sets,
            &self.deletes,
            &self.invalidations,
            &self.keys_invalidated,
            &self.errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Shared cache handle injected into repositories and handlers
#[derive(Debug)]
pub struct CacheManager {
    cache: Arc<dyn Cache>,
    operation_timeout: Duration,
    counters: Counters,
}

impl CacheManager {
    pub fn new(cache: Arc<dyn Cache>, operation_timeout: Duration) -> Self {
        Self {
            cache,
            operation_timeout,
            counters: Counters::default(),
        }
    }

    pub fn from_config(cache: Arc<dyn Cache>, config: &CacheConfig) -> Self {
        Self::new(cache, config.operation_timeout())
    }

    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    /// Runs one backend call under the timeout, absorbing any failure
    async fn guarded<T, F>(&self, operation: &'static str, target: &str, call: F) -> Option<T>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let outcome = match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::cache(format!(
                "{} timed out after {:?}",
                operation, self.operation_timeout
            ))),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                Counters::bump(&self.counters.errors, 1);
                record_cache_error(operation);

                if operation == "delete_by_pattern" {
                    error!(operation, target, error = %e, "Cache invalidation failed");
                } else {
                    warn!(
                        operation,
                        target,
                        error = %e,
                        "Cache operation failed, continuing without cache"
                    );
                }
                None
            }
        }
    }

    fn record_lookup(&self, key: &str, outcome: LookupOutcome) {
        let counter = match outcome {
            LookupOutcome::Hit => &self.counters.hits,
            LookupOutcome::Miss => &self.counters.misses,
        };
        Counters::bump(counter, 1);
        record_cache_lookup(key, outcome);
    }

    /// Typed lookup; failures, timeouts and undecodable entries all read as a miss
    pub async fn get<V>(&self, key: &str) -> Option<V>
    where
        V: DeserializeOwned,
    {
        let raw = self.guarded("get", key, self.cache.get_raw(key)).await.flatten();

        let Some(raw) = raw else {
            self.record_lookup(key, LookupOutcome::Miss);
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                self.record_lookup(key, LookupOutcome::Hit);
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping undecodable cache entry");
                self.record_lookup(key, LookupOutcome::Miss);
                self.delete(key).await;
                None
            }
        }
    }

    /// Stores a value, replacing any previous entry; returns whether it was stored
    pub async fn set<V>(&self, key: &str, value: &V, ttl: Duration) -> bool
    where
        V: Serialize + ?Sized,
    {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                Counters::bump(&self.counters.errors, 1);
                record_cache_error("set");
                warn!(key, error = %e, "Failed to serialize value for cache");
                return false;
            }
        };

        let stored = self
            .guarded("set", key, self.cache.set_raw(key, &raw, ttl))
            .await
            .is_some();

        if stored {
            Counters::bump(&self.counters.sets, 1);
        }
        stored
    }

    /// Removes one key; returns whether a live entry was removed
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self
            .guarded("delete", key, self.cache.delete(key))
            .await
            .unwrap_or(false);

        if removed {
            Counters::bump(&self.counters.deletes, 1);
        }
        removed
    }

    /// Removes every key matching the pattern; returns the number removed
    pub async fn delete_by_pattern(&self, pattern: &KeyPattern) -> usize {
        let target = pattern.as_str();
        let Some(removed) = self
            .guarded("delete_by_pattern", target, self.cache.delete_pattern(pattern))
            .await
        else {
            return 0;
        };

        Counters::bump(&self.counters.invalidations, 1);
        Counters::bump(&self.counters.keys_invalidated, removed as u64);
        record_cache_invalidation(target, removed);
        debug!(pattern = target, removed, "Invalidated cache keys");
        removed
    }

    /// Counters since the last reset plus the backend's current entry count
    pub async fn get_stats(&self) -> CacheStats {
        let size = self
            .guarded("size", "*", self.cache.size())
            .await
            .unwrap_or(0);
        record_cache_size(size);

        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let hits = load(&self.counters.hits);
        let misses = load(&self.counters.misses);

        CacheStats {
            hits,
            misses,
            sets: load(&self.counters.sets),
            deletes: load(&self.counters.deletes),
            invalidations: load(&self.counters.invalidations),
            keys_invalidated: load(&self.counters.keys_invalidated),
            errors: load(&self.counters.errors),
            hit_rate: CacheStats::compute_hit_rate(hits, misses),
            size,
        }
    }

    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    /// Drops every entry; returns whether the backend accepted the flush
    pub async fn flush(&self) -> bool {
        self.guarded("clear", "*", self.cache.clear()).await.is_some()
    }

    pub async fn purge_expired(&self) -> usize {
        self.guarded("purge_expired", "*", self.cache.purge_expired())
            .await
            .unwrap_or(0)
    }

    /// Reachability check for readiness; unlike the other calls this one reports failures
    pub async fn ping(&self) -> Result<(), DomainError> {
        tokio::time::timeout(self.operation_timeout, self.cache.ping())
            .await
            .map_err(|_| DomainError::cache("Cache ping timed out"))?
    }

    /// Periodically drops expired entries until the returned task is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        info!(interval_secs = interval.as_secs(), "Starting cache sweeper");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let purged = manager.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Swept expired cache entries");
                }
            }
        })
    }
}
