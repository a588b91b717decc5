//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use serde::{Serialize, de::DeserializeOwned};

use super::pattern::KeyPattern;
use crate::domain::DomainError;

/// Key-value store with per-entry TTL and glob deletes
///
/// Values travel as JSON strings so the trait stays dyn-compatible; the cache
/// manager owns encoding and decoding.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw JSON value; expired entries read as absent
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value, replacing any previous entry
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key matching the pattern, returning how many were removed
    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError>;

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of live entries
    async fn size(&self) -> Result<usize, DomainError>;

    /// Drops expired entries eagerly; returns how many were dropped
    async fn purge_expired(&self) -> Result<usize, DomainError> {
        Ok(0)
    }

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), DomainError> {
        self.size().await.map(|_| ())
    }

    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Typed get/set over a raw store, for exercising backends directly
#[cfg(test)]
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the cache with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

#[cfg(test)]
impl<T: Cache + ?Sized> CacheExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Mock cache for testing
    ///
    /// Entries never expire. Failures can be switched on and off at runtime
    /// to simulate an unreachable backend.
    #[derive(Debug, Default)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Duration)>>,
        error: Mutex<Option<String>>,
        fail_after_deletes: Mutex<Option<usize>>,
        failing: AtomicBool,
        deletes_seen: AtomicUsize,
        patterns: Mutex<Vec<String>>,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry<V: Serialize>(self, key: &str, value: &V, ttl: Duration) -> Self {
            let json = serde_json::to_string(value).unwrap();
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (json, ttl));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self.failing.store(true, Ordering::SeqCst);
            self
        }

        /// Let the first `n` pattern deletes succeed and fail the rest
        pub fn fail_pattern_deletes_after(self, n: usize) -> Self {
            *self.fail_after_deletes.lock().unwrap() = Some(n);
            self
        }

        pub fn set_failing(&self, failing: bool) {
            if failing && self.error.lock().unwrap().is_none() {
                *self.error.lock().unwrap() = Some("backend unavailable".to_string());
            }
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Patterns passed to `delete_pattern`, in call order
        pub fn patterns(&self) -> Vec<String> {
            self.patterns.lock().unwrap().clone()
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        pub fn ttl_of(&self, key: &str) -> Option<Duration> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if self.failing.load(Ordering::SeqCst) {
                let error = self
                    .error
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| "backend unavailable".to_string());
                return Err(DomainError::cache(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();

            Ok(entries.get(key).map(|(json, _)| json.clone()))
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
            self.patterns.lock().unwrap().push(pattern.to_string());
            self.check_error()?;

            let seen = self.deletes_seen.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = *self.fail_after_deletes.lock().unwrap() {
                if seen >= limit {
                    return Err(DomainError::cache("pattern delete interrupted"));
                }
            }

            let regex = pattern.to_regex()?;
            let mut entries = self.entries.lock().unwrap();
            let keys_to_remove: Vec<String> = entries
                .keys()
                .filter(|k| regex.is_match(k))
                .cloned()
                .collect();

            for key in &keys_to_remove {
                entries.remove(key);
            }

            Ok(keys_to_remove.len())
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().len())
        }

        fn backend_name(&self) -> &'static str {
            "mock"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockCache::new();
            cache
                .set("key1", &"value1", Duration::from_secs(60))
                .await
                .unwrap();

            let result: Option<String> = cache.get("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
            assert_eq!(cache.ttl_of("key1"), Some(Duration::from_secs(60)));
        }

        #[tokio::test]
        async fn test_mock_cache_get_missing() {
            let cache = MockCache::new();

            let result: Option<String> = cache.get("missing").await.unwrap();
            assert!(result.is_none());
        }

        #[tokio::test]
        async fn test_mock_cache_with_error() {
            let cache = MockCache::new().with_error("Test error");

            let result: Result<Option<String>, _> = cache.get("key").await;
            assert!(result.is_err());
            assert!(cache.ping().await.is_err());

            cache.set_failing(false);
            assert!(cache.ping().await.is_ok());
        }

        #[tokio::test]
        async fn test_mock_cache_typed_get_rejects_bad_payload() {
            let cache = MockCache::new().with_entry("key", &"not a number", Duration::from_secs(1));

            let result: Result<Option<u32>, _> = cache.get("key").await;
            assert!(matches!(result, Err(DomainError::Cache { .. })));
        }

        #[tokio::test]
        async fn test_mock_cache_delete_pattern() {
            let cache = MockCache::new()
                .with_entry("user:1:rel:-", &"data1", Duration::from_secs(60))
                .with_entry("user:2:rel:-", &"data2", Duration::from_secs(60))
                .with_entry("other:key", &"data3", Duration::from_secs(60));

            let deleted = cache
                .delete_pattern(&KeyPattern::new("user:*"))
                .await
                .unwrap();
            assert_eq!(deleted, 2);
            assert_eq!(cache.size().await.unwrap(), 1);
            assert_eq!(cache.patterns(), vec!["user:*".to_string()]);
        }

        #[tokio::test]
        async fn test_mock_cache_partial_pattern_failure() {
            let cache = MockCache::new().fail_pattern_deletes_after(1);

            assert!(cache.delete_pattern(&KeyPattern::new("a:*")).await.is_ok());
            assert!(cache.delete_pattern(&KeyPattern::new("b:*")).await.is_err());
        }
    }
}
