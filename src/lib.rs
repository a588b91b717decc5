//! FitTrack API
//!
//! Fitness-tracking backend built around cache-aside repositories:
//! - Cached reads keyed by typed filter tables
//! - Pattern invalidation on every write
//! - In-memory (moka) or Redis cache store, in-memory or PostgreSQL storage
//! - ETag and Cache-Control handling per route

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{BodyMetric, Equipment, Exercise, Resource, User, WorkoutPlan};
use infrastructure::cache::{CacheConfig, CacheFactory, CacheManager};
use infrastructure::repository::CachedRepository;
use infrastructure::storage::{StorageFactory, StorageType, seed_catalog};
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = create_cache_manager(&config.cache).await?;
    create_app_state_with_cache(config, cache).await
}

/// Build the cache store selected by configuration
pub async fn create_cache_manager(config: &CacheConfig) -> anyhow::Result<Arc<CacheManager>> {
    let backend = CacheFactory::new().create(config).await?;
    info!(
        backend = backend.backend_name(),
        default_ttl_secs = config.default_ttl_secs,
        "Cache store ready"
    );

    Ok(Arc::new(CacheManager::from_config(backend, config)))
}

/// Create the application state around an existing cache manager
pub async fn create_app_state_with_cache(
    config: &AppConfig,
    cache: Arc<CacheManager>,
) -> anyhow::Result<AppState> {
    let storage = StorageFactory::connect(config.storage.clone()).await?;
    info!(backend = %storage.storage_type(), "Storage ready");

    let user_store = storage.create::<User>("users").await?;
    let equipment_store = storage.create::<Equipment>("equipment").await?;
    let exercise_store = storage.create::<Exercise>("exercises").await?;
    let plan_store = storage.create::<WorkoutPlan>("workout_plans").await?;
    let metric_store = storage.create::<BodyMetric>("body_metrics").await?;

    if config.storage.seed_catalog && storage.storage_type() == StorageType::InMemory {
        seed_catalog(&equipment_store, &exercise_store).await?;
    }

    let cache_config = &config.cache;
    Ok(AppState {
        users: repository(user_store, &cache, cache_config),
        equipment: repository(equipment_store, &cache, cache_config),
        exercises: repository(exercise_store, &cache, cache_config),
        workout_plans: repository(plan_store, &cache, cache_config),
        body_metrics: repository(metric_store, &cache, cache_config),
        cache,
    })
}

fn repository<E: Resource>(
    storage: Arc<dyn domain::Storage<E>>,
    cache: &Arc<CacheManager>,
    config: &CacheConfig,
) -> Arc<CachedRepository<E>> {
    Arc::new(CachedRepository::from_config(storage, cache.clone(), config))
}
