//! Cache infrastructure - Cache backends and the fail-open manager

mod factory;
mod in_memory;
mod manager;
mod redis;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use manager::CacheManager;
pub use redis::{RedisCache, RedisCacheConfig};
