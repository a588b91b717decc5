//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::DomainError;
use crate::domain::cache::{Cache, KeyPattern};

const SCAN_BATCH: usize = 200;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Entries expire server-side (`PSETEX`); pattern deletes walk the keyspace
/// with `SCAN MATCH` and delete each batch.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connect = ConnectionManager::new(client);
        let connection = tokio::time::timeout(config.connection_timeout, connect)
            .await
            .map_err(|_| {
                DomainError::cache(format!(
                    "Timed out connecting to Redis after {:?}",
                    config.connection_timeout
                ))
            })?
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn scan(&self, glob: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(glob)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::cache(format!(
                        "Failed to scan keys with pattern '{}': {}",
                        glob, e
                    ))
                })?;

            found.extend(keys);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once
        found.sort();
        found.dedup();
        Ok(found)
    }
}

/// Characters Redis glob matching treats specially; the wildcards come first
const GLOB_SPECIAL: [char; 6] = ['*', '?', '[', ']', '\\', '^'];

/// Translate a key pattern into Redis glob syntax
///
/// Only `*` and `?` are wildcards in key patterns, so the other characters
/// Redis treats specially are escaped.
fn redis_glob(pattern: &str) -> String {
    escape_glob(pattern, &GLOB_SPECIAL[2..])
}

/// SCAN MATCH argument for a key pattern under an optional key prefix
///
/// The prefix is a literal, so every glob metacharacter in it is escaped.
fn scan_match(prefix: Option<&str>, pattern: &str) -> String {
    let glob = redis_glob(pattern);
    match prefix {
        Some(prefix) => format!("{}:{}", escape_glob(prefix, &GLOB_SPECIAL), glob),
        None => glob,
    }
}

fn escape_glob(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<String> = conn.get(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        Ok(result)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_millis = ttl.as_millis().max(1) as u64;

        let _: () = conn
            .pset_ex(&prefixed_key, value, ttl_millis)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn.del(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to delete key '{}': {}", key, e))
        })?;

        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
        if pattern.is_exact() {
            return Ok(usize::from(self.delete(pattern.as_str()).await?));
        }

        let glob = scan_match(self.config.key_prefix.as_deref(), pattern.as_str());
        let keys = self.scan(&glob).await?;
        let mut conn = self.connection.clone();
        let mut total_deleted = 0usize;

        for batch in keys.chunks(SCAN_BATCH) {
            let deleted: i64 = conn
                .del(batch)
                .await
                .map_err(|e| DomainError::cache(format!("Failed to delete keys: {}", e)))?;
            total_deleted += deleted as usize;
        }

        Ok(total_deleted)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        // Without a prefix the whole database belongs to us
        match &self.config.key_prefix {
            Some(_) => {
                self.delete_pattern(&KeyPattern::new("*")).await?;
            }
            None => {
                let mut conn = self.connection.clone();
                redis::cmd("FLUSHDB")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to flush database: {}", e)))?;
            }
        }

        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        match &self.config.key_prefix {
            Some(prefix) => Ok(self.scan(&scan_match(Some(prefix), "*")).await?.len()),
            None => {
                let mut conn = self.connection.clone();
                let size: usize = redis::cmd("DBSIZE")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| {
                        DomainError::cache(format!("Failed to get database size: {}", e))
                    })?;
                Ok(size)
            }
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::cache(format!("Redis ping failed: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    // These tests need a Redis server on localhost and are ignored by default

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("fittrack-test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("user:filters", &"rows", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("user:filters").await.unwrap();
        assert_eq!(result, Some("rows".to_string()));

        cache.delete("user:filters").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_pattern() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        for key in [
            "equipment:filters",
            "equipment:filters:cat:CARDIO:limit:20",
            "equipment:abc:rel:-",
        ] {
            cache.set(key, &1, Duration::from_secs(60)).await.unwrap();
        }

        let deleted = cache
            .delete_pattern(&KeyPattern::new("equipment:filters*"))
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let survivor: Option<i32> = cache.get("equipment:abc:rel:-").await.unwrap();
        assert_eq!(survivor, Some(1));

        cache.clear().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ttl_expiry() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("short", &"value", Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        let result: Option<String> = cache.get("short").await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_redis_glob_escapes_brackets() {
        assert_eq!(redis_glob("user:filters*"), "user:filters*");
        assert_eq!(redis_glob("a[b]c?"), "a\\[b\\]c?");
        assert_eq!(redis_glob("x\\y"), "x\\\\y");
    }

    #[test]
    fn test_scan_match_escapes_prefix() {
        assert_eq!(scan_match(None, "user:*"), "user:*");
        assert_eq!(scan_match(Some("fittrack"), "user:*"), "fittrack:user:*");
        assert_eq!(
            scan_match(Some("tenant[1]*"), "user:filters*"),
            "tenant\\[1\\]\\*:user:filters*"
        );
        assert_eq!(scan_match(Some("a?b"), "*"), "a\\?b:*");
    }

    #[test]
    fn test_config_builder() {
        let config = RedisCacheConfig::new("redis://localhost")
            .with_key_prefix("fittrack")
            .with_connection_timeout(Duration::from_secs(1));

        assert_eq!(config.key_prefix, Some("fittrack".to_string()));
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
    }
}
