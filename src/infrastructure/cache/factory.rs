//! Cache factory for runtime selection

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::cache::Cache;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Cache section of the application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend to create
    pub backend: CacheType,
    /// Redis URL (required for Redis backend)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing (Redis only)
    pub key_prefix: Option<String>,
    /// TTL applied to resources without an override
    pub default_ttl_secs: u64,
    /// Per-resource TTL overrides, keyed by resource name
    pub ttl_overrides: HashMap<String, u64>,
    /// Maximum capacity (in-memory only)
    pub max_capacity: u64,
    /// Upper bound on any entry's lifetime (in-memory only)
    pub max_ttl_secs: u64,
    /// Budget for each backend call before it is treated as a failure
    pub operation_timeout_ms: u64,
    /// Repository queries slower than this are logged as warnings
    pub slow_query_threshold_ms: u64,
    /// Interval of the expired-entry sweep; 0 disables it
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttl_overrides = HashMap::from([
            ("equipment".to_string(), 3600),
            ("exercise".to_string(), 3600),
            ("user".to_string(), 300),
            ("workout_plan".to_string(), 300),
            ("body_metric".to_string(), 120),
        ]);

        Self {
            backend: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            default_ttl_secs: 300,
            ttl_overrides,
            max_capacity: 10_000,
            max_ttl_secs: 2 * 24 * 3600,
            operation_timeout_ms: 250,
            slow_query_threshold_ms: 1000,
            sweep_interval_secs: 60,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration for in-memory cache
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a new configuration for Redis cache
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_secs = ttl.as_secs();
        self
    }

    /// Overrides the TTL for one resource
    pub fn with_ttl_override(mut self, resource: impl Into<String>, ttl: Duration) -> Self {
        self.ttl_overrides.insert(resource.into(), ttl.as_secs());
        self
    }

    /// Sets the maximum capacity (in-memory only)
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// TTL for a resource: its override if configured, the default otherwise
    pub fn ttl_for(&self, resource: &str) -> Duration {
        self.ttl_overrides
            .get(resource)
            .map(|secs| Duration::from_secs(*secs))
            .unwrap_or_else(|| self.default_ttl())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }

    /// Sweep interval, if the sweep is enabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Check the values that would make the cache unusable
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.default_ttl_secs == 0 {
            return Err(DomainError::configuration("cache.default_ttl_secs must be > 0"));
        }
        if let Some((resource, _)) = self.ttl_overrides.iter().find(|(_, ttl)| **ttl == 0) {
            return Err(DomainError::configuration(format!(
                "cache.ttl_overrides.{} must be > 0",
                resource
            )));
        }
        if self.operation_timeout_ms == 0 {
            return Err(DomainError::configuration(
                "cache.operation_timeout_ms must be > 0",
            ));
        }
        Ok(())
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache instance based on configuration
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn Cache>, DomainError> {
        config.validate()?;

        match config.backend {
            CacheType::InMemory => {
                let in_memory_config = InMemoryCacheConfig::default()
                    .with_max_capacity(config.max_capacity)
                    .with_max_ttl(Duration::from_secs(config.max_ttl_secs));

                Ok(Arc::new(InMemoryCache::with_config(in_memory_config)))
            }
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let mut redis_config = RedisCacheConfig::new(url);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                let cache = RedisCache::new(redis_config).await?;
                Ok(Arc::new(cache))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("in_memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("REDIS".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert!("memcached".parse::<CacheType>().is_err());
    }

    #[test]
    fn test_ttl_for_uses_overrides() {
        let config = CacheConfig::in_memory()
            .with_default_ttl(Duration::from_secs(42))
            .with_ttl_override("equipment", Duration::from_secs(3600));

        assert_eq!(config.ttl_for("equipment"), Duration::from_secs(3600));
        assert_eq!(config.ttl_for("unknown"), Duration::from_secs(42));
    }

    #[test]
    fn test_validate() {
        assert!(CacheConfig::default().validate().is_ok());

        let zero_default = CacheConfig {
            default_ttl_secs: 0,
            ..Default::default()
        };
        assert!(zero_default.validate().is_err());

        let zero_override = CacheConfig::default().with_ttl_override("user", Duration::ZERO);
        assert!(zero_override.validate().is_err());
    }

    #[test]
    fn test_sweep_interval() {
        let disabled = CacheConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(disabled.sweep_interval(), None);
        assert_eq!(
            CacheConfig::default().sweep_interval(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_deserialize_partial_section() {
        let config: CacheConfig = serde_json::from_value(serde_json::json!({
            "backend": "redis",
            "redis_url": "redis://cache:6379",
            "ttl_overrides": { "exercise": 86400 }
        }))
        .unwrap();

        assert_eq!(config.backend, CacheType::Redis);
        assert_eq!(config.ttl_for("exercise"), Duration::from_secs(86400));
        assert_eq!(config.operation_timeout_ms, 250);
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let factory = CacheFactory::new();
        let cache = factory.create(&CacheConfig::in_memory()).await.unwrap();

        cache
            .set("test", &"value", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("test").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
        assert_eq!(cache.backend_name(), "in_memory");
    }

    #[tokio::test]
    async fn test_factory_create_redis_missing_url() {
        let factory = CacheFactory::new();
        let config = CacheConfig {
            backend: CacheType::Redis,
            redis_url: None,
            ..Default::default()
        };

        let result = factory.create(&config).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
