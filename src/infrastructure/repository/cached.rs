//! Read-through repository with write-side invalidation

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, warn};

use crate::domain::cache::KeyPattern;
use crate::domain::resource::{Relation, Resource, ResourceFilter};
use crate::domain::storage::{Storage, StorageKey};
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, CacheManager};
use crate::infrastructure::observability::{RepositoryQueryMetricParams, record_repository_query};

const DEFAULT_SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(1);

/// Repository for one resource, caching reads and invalidating on writes
///
/// Reads check the cache first and fall back to storage, caching only
/// results that exist. Writes go to storage and then await the removal of
/// every key the write could have made stale: the entity's own keys, all
/// list queries of the resource, and the secondary lookup keys of both the
/// previous and the new state.
pub struct CachedRepository<E: Resource> {
    storage: Arc<dyn Storage<E>>,
    cache: Arc<CacheManager>,
    ttl: Duration,
    slow_query_threshold: Duration,
}

impl<E: Resource> Clone for CachedRepository<E> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
            slow_query_threshold: self.slow_query_threshold,
        }
    }
}

impl<E: Resource> std::fmt::Debug for CachedRepository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRepository")
            .field("resource", &E::NAME)
            .field("storage", &self.storage.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<E: Resource> CachedRepository<E> {
    pub fn new(storage: Arc<dyn Storage<E>>, cache: Arc<CacheManager>, ttl: Duration) -> Self {
        Self {
            storage,
            cache,
            ttl,
            slow_query_threshold: DEFAULT_SLOW_QUERY_THRESHOLD,
        }
    }

    /// Repository using the TTL and slow-query threshold configured for `E`
    pub fn from_config(
        storage: Arc<dyn Storage<E>>,
        cache: Arc<CacheManager>,
        config: &CacheConfig,
    ) -> Self {
        Self::new(storage, cache, config.ttl_for(E::NAME))
            .with_slow_query_threshold(config.slow_query_threshold())
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn storage(&self) -> &Arc<dyn Storage<E>> {
        &self.storage
    }

    /// Times a storage call, warning when it crosses the slow-query threshold
    pub(crate) async fn timed<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let started = Instant::now();
        let result = call.await;
        let elapsed = started.elapsed();
        let slow = elapsed >= self.slow_query_threshold;

        if slow {
            warn!(
                resource = E::NAME,
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_query_threshold.as_millis() as u64,
                "Slow query"
            );
        }

        record_repository_query(RepositoryQueryMetricParams {
            resource: E::NAME,
            operation,
            duration: elapsed,
            slow,
        });

        result
    }

    /// Cache-aside read: a hit returns the cached value, a miss runs `load`
    /// and caches what it found
    pub(crate) async fn read_through<T, F>(
        &self,
        key: &str,
        operation: &'static str,
        load: F,
    ) -> Result<Option<T>, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<Option<T>, DomainError>>,
    {
        if let Some(cached) = self.cache.get::<T>(key).await {
            return Ok(Some(cached));
        }

        let loaded = self.timed(operation, load).await?;
        if let Some(value) = &loaded {
            self.cache.set(key, value, self.ttl).await;
        }

        debug!(resource = E::NAME, key, found = loaded.is_some(), "Loaded from storage");
        Ok(loaded)
    }

    /// Loads one entity with the requested relations
    pub async fn find_by_id(
        &self,
        id: &E::Key,
        include: &[E::Relation],
    ) -> Result<Option<E>, DomainError> {
        let key = E::KEYS.entity(id.as_str(), include.iter().map(Relation::as_str));

        self.read_through(&key, "find_by_id", async {
            let found = self.storage.get(id).await?;
            Ok::<_, DomainError>(found.map(|mut entity| {
                entity.retain_relations(include);
                entity
            }))
        })
        .await
    }

    /// Runs a list query
    pub async fn find_many(&self, filter: &E::Filter) -> Result<Vec<E>, DomainError> {
        let key = E::KEYS.filters(filter);

        let rows = self
            .read_through(&key, "find_many", async {
                let all = self.storage.list().await?;
                Ok::<_, DomainError>(Some(filter.apply(all)))
            })
            .await?;

        Ok(rows.unwrap_or_default())
    }

    /// Creates an entity and clears the lists it may join
    pub async fn create(&self, draft: E::Draft) -> Result<E, DomainError> {
        let repo = self.clone();
        self.detached("create", async move { repo.create_now(draft).await }).await
    }

    /// Applies a patch to the stored entity
    ///
    /// The previous state is read from storage, never from the cache, so the
    /// old secondary keys are known even when the cached copy is stale.
    pub async fn update(&self, id: &E::Key, patch: E::Patch) -> Result<E, DomainError> {
        let repo = self.clone();
        let id = id.clone();
        self.detached("update", async move { repo.update_now(&id, patch).await }).await
    }

    /// Deletes an entity; returns whether it existed
    pub async fn delete(&self, id: &E::Key) -> Result<bool, DomainError> {
        let repo = self.clone();
        let id = id.clone();
        self.detached("delete", async move { repo.delete_now(&id).await }).await
    }

    /// Runs a write and its invalidation on their own task
    ///
    /// Dropping the caller (client disconnect, shutdown abort) must not leave a
    /// committed write with its cache entries still in place.
    async fn detached<T, F>(&self, operation: &'static str, write: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        tokio::spawn(write).await.map_err(|e| {
            error!(resource = E::NAME, operation, error = %e, "Write task failed");
            DomainError::internal(format!("{} {} failed: {}", E::NAME, operation, e))
        })?
    }

    async fn create_now(&self, draft: E::Draft) -> Result<E, DomainError> {
        let entity = E::from_draft(draft)?;
        let created = self.timed("create", self.storage.create(entity)).await?;

        self.invalidate(created.key(), &[&created]).await;
        Ok(created)
    }

    async fn update_now(&self, id: &E::Key, patch: E::Patch) -> Result<E, DomainError> {
        let before = self
            .timed("find_by_id", self.storage.get(id))
            .await?
            .ok_or_else(|| DomainError::not_found(format!("{} '{}' not found", E::NAME, id)))?;

        let mut after = before.clone();
        after.apply_patch(patch)?;
        let updated = self.timed("update", self.storage.update(after)).await?;

        self.invalidate(id, &[&before, &updated]).await;
        Ok(updated)
    }

    async fn delete_now(&self, id: &E::Key) -> Result<bool, DomainError> {
        let before = self.timed("find_by_id", self.storage.get(id)).await?;
        let deleted = self.timed("delete", self.storage.delete(id)).await?;

        let snapshots: Vec<&E> = before.iter().collect();
        self.invalidate(id, &snapshots).await;
        Ok(deleted)
    }

    /// Patterns a write to `id` must clear, given the entity's states around the write
    pub fn invalidation_patterns(id: &E::Key, snapshots: &[&E]) -> Vec<KeyPattern> {
        let secondary: BTreeSet<String> = snapshots
            .iter()
            .flat_map(|entity| entity.secondary_keys())
            .collect();

        let mut patterns = vec![E::KEYS.entity_pattern(id.as_str()), E::KEYS.filters_pattern()];
        patterns.extend(secondary.into_iter().map(KeyPattern::new));
        patterns
    }

    /// Clears every key a write to `id` may have made stale; returns the number removed
    pub async fn invalidate(&self, id: &E::Key, snapshots: &[&E]) -> usize {
        let mut removed = 0;
        for pattern in Self::invalidation_patterns(id, snapshots) {
            removed += self.cache.delete_by_pattern(&pattern).await;
        }

        debug!(resource = E::NAME, id = %id, removed, "Invalidated after write");
        removed
    }

    /// Clears every cached key of this resource
    pub async fn invalidate_all(&self) -> usize {
        self.cache.delete_by_pattern(&E::KEYS.namespace_pattern()).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::cache::{Cache, MockCache};
    use crate::domain::equipment::{
        Equipment, EquipmentCategory, EquipmentDraft, EquipmentFilter, EquipmentPatch,
    };
    use crate::domain::storage::MockStorage;
    use crate::domain::user::{User, UserPatch, UserProfile, UserRelation};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::storage::InMemoryStorage;

    /// Storage wrapper counting calls that reach the system of record
    #[derive(Debug)]
    pub(crate) struct CountingStorage<E: Resource> {
        inner: InMemoryStorage<E>,
        reads: AtomicUsize,
    }

    impl<E: Resource> CountingStorage<E> {
        pub(crate) fn new(entities: Vec<E>) -> Self {
            Self {
                inner: InMemoryStorage::with_entities(entities),
                reads: AtomicUsize::new(0),
            }
        }

        pub(crate) fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<E: Resource> Storage<E> for CountingStorage<E> {
        async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn list(&self) -> Result<Vec<E>, DomainError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.list().await
        }

        async fn create(&self, entity: E) -> Result<E, DomainError> {
            self.inner.create(entity).await
        }

        async fn update(&self, entity: E) -> Result<E, DomainError> {
            self.inner.update(entity).await
        }

        async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
            self.inner.delete(key).await
        }

        async fn ping(&self) -> Result<(), DomainError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    /// In-memory cache whose pattern deletes take a while
    #[derive(Debug)]
    struct SlowInvalidation {
        inner: InMemoryCache,
        delay: Duration,
    }

    #[async_trait]
    impl Cache for SlowInvalidation {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.inner.get_raw(key).await
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.inner.set_raw(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.inner.delete(key).await
        }

        async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
            tokio::time::sleep(self.delay).await;
            self.inner.delete_pattern(pattern).await
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.inner.clear().await
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.inner.size().await
        }

        fn backend_name(&self) -> &'static str {
            "slow_invalidation"
        }
    }

    pub(crate) fn in_memory_cache() -> Arc<CacheManager> {
        Arc::new(CacheManager::new(
            Arc::new(InMemoryCache::new()),
            Duration::from_millis(200),
        ))
    }

    fn equipment(name: &str, category: EquipmentCategory) -> Equipment {
        Equipment::new(name, category).unwrap()
    }

    fn cardio_catalog() -> Vec<Equipment> {
        let mut catalog: Vec<Equipment> = (1..=7)
            .map(|i| equipment(&format!("Cardio {}", i), EquipmentCategory::Cardio))
            .collect();
        catalog.push(equipment("Barbell", EquipmentCategory::FreeWeights));
        catalog.push(equipment("Leg Press", EquipmentCategory::Strength));
        catalog
    }

    fn cardio_filter() -> EquipmentFilter {
        EquipmentFilter {
            category: Some(EquipmentCategory::Cardio),
            limit: Some(20),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_read_through_and_recompute_after_update() {
        let catalog = cardio_catalog();
        let target = catalog[0].id().clone();
        let storage = Arc::new(CountingStorage::new(catalog));
        let cache = in_memory_cache();
        let repo = CachedRepository::new(storage.clone(), cache.clone(), Duration::from_secs(3600));

        let filter = cardio_filter();
        assert_eq!(
            Equipment::KEYS.filters(&filter),
            "equipment:filters:cat:CARDIO:limit:20"
        );

        let first = repo.find_many(&filter).await.unwrap();
        assert_eq!(first.len(), 7);
        assert_eq!(storage.reads(), 1);

        let second = repo.find_many(&filter).await.unwrap();
        assert_eq!(second.len(), 7);
        assert_eq!(storage.reads(), 1);

        let patch = EquipmentPatch {
            category: Some(EquipmentCategory::Strength),
            ..Default::default()
        };
        repo.update(&target, patch).await.unwrap();

        let third = repo.find_many(&filter).await.unwrap();
        assert_eq!(third.len(), 6);

        let stats = cache.get_stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test]
    async fn test_find_by_id_queries_storage_once() {
        let item = equipment("Treadmill", EquipmentCategory::Cardio);
        let id = item.id().clone();

        let mut storage = MockStorage::<Equipment>::new();
        let stored = item.clone();
        storage
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let repo = CachedRepository::new(
            Arc::new(storage),
            in_memory_cache(),
            Duration::from_secs(60),
        );

        let first = repo.find_by_id(&id, &[]).await.unwrap().unwrap();
        let second = repo.find_by_id(&id, &[]).await.unwrap().unwrap();
        assert_eq!(first.name(), "Treadmill");
        assert_eq!(second.name(), "Treadmill");
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_cached() {
        let item = equipment("Ghost", EquipmentCategory::Cardio);
        let id = item.id().clone();

        let mut storage = MockStorage::<Equipment>::new();
        storage.expect_get().times(2).returning(|_| Ok(None));

        let cache = in_memory_cache();
        let repo = CachedRepository::new(Arc::new(storage), cache.clone(), Duration::from_secs(60));

        assert!(repo.find_by_id(&id, &[]).await.unwrap().is_none());
        assert!(repo.find_by_id(&id, &[]).await.unwrap().is_none());
        assert_eq!(cache.get_stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_relations_are_part_of_the_key() {
        let user = User::new("lifter@example.com", "Lifter")
            .unwrap()
            .with_profile(UserProfile {
                bio: Some("Powerlifting".to_string()),
                ..Default::default()
            });
        let id = user.id().clone();
        let storage = Arc::new(CountingStorage::new(vec![user]));
        let repo = CachedRepository::new(
            storage.clone(),
            in_memory_cache(),
            Duration::from_secs(60),
        );

        let bare = repo.find_by_id(&id, &[]).await.unwrap().unwrap();
        assert!(bare.profile().is_none());

        let full = repo
            .find_by_id(&id, &[UserRelation::Profile])
            .await
            .unwrap()
            .unwrap();
        assert!(full.profile().is_some());
        assert_eq!(storage.reads(), 2);
    }

    #[tokio::test]
    async fn test_get_failure_falls_back_to_storage() {
        let item = equipment("Bike", EquipmentCategory::Cardio);
        let id = item.id().clone();

        let mut storage = MockStorage::<Equipment>::new();
        let stored = item.clone();
        storage
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let mock = Arc::new(MockCache::new().with_error("connection reset"));
        let cache = Arc::new(CacheManager::new(mock, Duration::from_millis(100)));
        let repo = CachedRepository::new(Arc::new(storage), cache.clone(), Duration::from_secs(60));

        let found = repo.find_by_id(&id, &[]).await.unwrap();
        assert_eq!(found.map(|e| e.name().to_string()), Some("Bike".to_string()));
        assert!(cache.get_stats().await.errors >= 2);
    }

    #[tokio::test]
    async fn test_invalidation_failure_does_not_fail_the_write() {
        let item = equipment("Rower", EquipmentCategory::Cardio);
        let id = item.id().clone();
        let storage = Arc::new(InMemoryStorage::with_entities(vec![item]));

        let mock = Arc::new(MockCache::new().fail_pattern_deletes_after(1));
        let cache = Arc::new(CacheManager::new(mock.clone(), Duration::from_millis(100)));
        let repo = CachedRepository::new(storage.clone(), cache, Duration::from_secs(60));

        let patch = EquipmentPatch {
            name: Some("Air Rower".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&id, patch).await.unwrap();
        assert_eq!(updated.name(), "Air Rower");

        // Every pattern was still attempted after the first failure
        assert_eq!(mock.patterns().len(), 3);
        let stored = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.name(), "Air Rower");
    }

    #[tokio::test]
    async fn test_update_invalidates_old_and_new_secondary_keys() {
        let item = equipment("Elliptical", EquipmentCategory::Cardio);
        let id = item.id().clone();
        let storage = Arc::new(InMemoryStorage::with_entities(vec![item]));
        let mock = Arc::new(MockCache::new());
        let cache = Arc::new(CacheManager::new(mock.clone(), Duration::from_millis(100)));
        let repo = CachedRepository::new(storage, cache, Duration::from_secs(60));

        let patch = EquipmentPatch {
            category: Some(EquipmentCategory::Strength),
            ..Default::default()
        };
        repo.update(&id, patch).await.unwrap();

        assert_eq!(
            mock.patterns(),
            vec![
                format!("equipment:{}:*", id),
                "equipment:filters*".to_string(),
                "equipment:category:CARDIO".to_string(),
                "equipment:category:STRENGTH".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_email_change_clears_both_lookups() {
        let user = User::new("old@example.com", "Mover").unwrap();
        let id = user.id().clone();
        let storage = Arc::new(InMemoryStorage::with_entities(vec![user]));
        let mock = Arc::new(
            MockCache::new()
                .with_entry("user:email:old@example.com", &"stale", Duration::from_secs(60))
                .with_entry("user:email:new@example.com", &"stale", Duration::from_secs(60))
                .with_entry("user:email:other@example.com", &"keep", Duration::from_secs(60)),
        );
        let cache = Arc::new(CacheManager::new(mock.clone(), Duration::from_millis(100)));
        let repo = CachedRepository::new(storage, cache, Duration::from_secs(60));

        let patch = UserPatch {
            email: Some("New@Example.com".to_string()),
            ..Default::default()
        };
        repo.update(&id, patch).await.unwrap();

        assert_eq!(mock.keys(), vec!["user:email:other@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_create_and_delete_invalidate_lists() {
        let storage = Arc::new(CountingStorage::new(cardio_catalog()));
        let repo = CachedRepository::new(
            storage.clone(),
            in_memory_cache(),
            Duration::from_secs(60),
        );
        let filter = cardio_filter();

        assert_eq!(repo.find_many(&filter).await.unwrap().len(), 7);

        let created = repo
            .create(EquipmentDraft {
                name: "Stair Climber".to_string(),
                category: EquipmentCategory::Cardio,
                brand: None,
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(repo.find_many(&filter).await.unwrap().len(), 8);

        assert!(repo.delete(created.id()).await.unwrap());
        assert_eq!(repo.find_many(&filter).await.unwrap().len(), 7);
        assert!(!repo.delete(created.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_entity_key_survives_list_invalidation() {
        let item = equipment("Kettlebell", EquipmentCategory::FreeWeights);
        let id = item.id().clone();
        let storage = Arc::new(CountingStorage::new(vec![item]));
        let cache = in_memory_cache();
        let repo = CachedRepository::new(storage.clone(), cache.clone(), Duration::from_secs(60));

        repo.find_by_id(&id, &[]).await.unwrap();
        cache
            .delete_by_pattern(&Equipment::KEYS.filters_pattern())
            .await;
        repo.find_by_id(&id, &[]).await.unwrap();

        assert_eq!(storage.reads(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_entity_is_not_found() {
        let storage = Arc::new(InMemoryStorage::<Equipment>::new());
        let mock = Arc::new(MockCache::new());
        let cache = Arc::new(CacheManager::new(mock.clone(), Duration::from_millis(100)));
        let repo = CachedRepository::new(storage, cache, Duration::from_secs(60));

        let id = equipment("Nothing", EquipmentCategory::Cardio).id().clone();
        let result = repo.update(&id, EquipmentPatch::default()).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(mock.patterns().is_empty());
    }

    #[tokio::test]
    async fn test_configured_ttl_is_used() {
        let item = equipment("Bench", EquipmentCategory::Strength);
        let id = item.id().clone();
        let mock = Arc::new(MockCache::new());
        let cache = Arc::new(CacheManager::new(mock.clone(), Duration::from_millis(100)));
        let config =
            CacheConfig::in_memory().with_ttl_override("equipment", Duration::from_secs(900));

        let repo = CachedRepository::from_config(
            Arc::new(InMemoryStorage::with_entities(vec![item])),
            cache,
            &config,
        );
        repo.find_by_id(&id, &[]).await.unwrap();

        let key = Equipment::KEYS.entity(id.as_str(), std::iter::empty());
        assert_eq!(mock.ttl_of(&key), Some(Duration::from_secs(900)));
    }

    #[tokio::test]
    async fn test_slow_queries_still_return() {
        let storage = Arc::new(
            InMemoryStorage::with_entities(cardio_catalog())
                .with_latency(Duration::from_millis(15)),
        );
        let repo = CachedRepository::new(storage, in_memory_cache(), Duration::from_secs(60))
            .with_slow_query_threshold(Duration::from_millis(1));

        assert_eq!(repo.find_many(&cardio_filter()).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_namespace_only() {
        let cache = in_memory_cache();
        let ttl = Duration::from_secs(60);
        cache.set("equipment:filters", &1, ttl).await;
        cache.set("equipment:abc:rel:-", &1, ttl).await;
        cache.set("exercise:filters", &1, ttl).await;

        let repo = CachedRepository::<Equipment>::new(
            Arc::new(InMemoryStorage::new()),
            cache.clone(),
            ttl,
        );
        assert_eq!(repo.invalidate_all().await, 2);
        assert_eq!(cache.get::<i32>("exercise:filters").await, Some(1));
    }

    #[tokio::test]
    async fn test_cancelled_update_still_invalidates() {
        let catalog = cardio_catalog();
        let target = catalog[0].id().clone();
        let storage = Arc::new(InMemoryStorage::with_entities(catalog));
        let slow = SlowInvalidation {
            inner: InMemoryCache::new(),
            delay: Duration::from_millis(50),
        };
        let cache = Arc::new(CacheManager::new(Arc::new(slow), Duration::from_millis(500)));
        let repo = CachedRepository::<Equipment>::new(
            storage.clone(),
            cache,
            Duration::from_secs(3600),
        );

        let filter = cardio_filter();
        assert_eq!(repo.find_many(&filter).await.unwrap().len(), 7);

        let patch = EquipmentPatch {
            category: Some(EquipmentCategory::Strength),
            ..Default::default()
        };
        let outcome =
            tokio::time::timeout(Duration::from_millis(20), repo.update(&target, patch)).await;
        assert!(outcome.is_err(), "update should still be invalidating");

        // The write keeps running after the caller gave up
        tokio::time::sleep(Duration::from_millis(600)).await;

        let stored = storage.get(&target).await.unwrap().unwrap();
        assert_eq!(stored.category(), EquipmentCategory::Strength);
        assert_eq!(repo.find_many(&filter).await.unwrap().len(), 6);
    }
}
