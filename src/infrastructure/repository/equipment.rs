//! Equipment lookups by category

use crate::domain::DomainError;
use crate::domain::equipment::{CATEGORY_LOOKUP, Equipment, EquipmentCategory, EquipmentFilter};
use crate::domain::resource::{Resource, ResourceFilter};

use super::CachedRepository;

impl CachedRepository<Equipment> {
    /// Active equipment in one category, cached under `equipment:category:<CATEGORY>`
    pub async fn find_by_category(
        &self,
        category: EquipmentCategory,
    ) -> Result<Vec<Equipment>, DomainError> {
        let key = Equipment::KEYS.secondary(CATEGORY_LOOKUP, category.as_str());
        let filter = EquipmentFilter {
            active: Some(true),
            ..EquipmentFilter::by_category(category)
        };

        let rows = self
            .read_through(&key, "find_by_category", async {
                let all = self.storage().list().await?;
                Ok::<_, DomainError>(Some(filter.apply(all)))
            })
            .await?;

        Ok(rows.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::super::cached::tests::{CountingStorage, in_memory_cache};
    use super::*;
    use crate::domain::equipment::EquipmentPatch;

    fn catalog() -> Vec<Equipment> {
        vec![
            Equipment::new("Treadmill", EquipmentCategory::Cardio).unwrap(),
            Equipment::new("Spin Bike", EquipmentCategory::Cardio).unwrap(),
            Equipment::new("Squat Rack", EquipmentCategory::Strength).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_find_by_category_is_cached() {
        let storage = Arc::new(CountingStorage::new(catalog()));
        let repo = CachedRepository::<Equipment>::new(
            storage.clone(),
            in_memory_cache(),
            Duration::from_secs(60),
        );

        let first = repo.find_by_category(EquipmentCategory::Cardio).await.unwrap();
        let second = repo.find_by_category(EquipmentCategory::Cardio).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(storage.reads(), 1);
    }

    #[tokio::test]
    async fn test_category_move_refreshes_both_lookups() {
        let items = catalog();
        let treadmill = items[0].id().clone();
        let storage = Arc::new(CountingStorage::new(items));
        let repo = CachedRepository::<Equipment>::new(
            storage,
            in_memory_cache(),
            Duration::from_secs(60),
        );

        assert_eq!(repo.find_by_category(EquipmentCategory::Cardio).await.unwrap().len(), 2);
        assert_eq!(repo.find_by_category(EquipmentCategory::Strength).await.unwrap().len(), 1);

        let patch = EquipmentPatch {
            category: Some(EquipmentCategory::Strength),
            ..Default::default()
        };
        repo.update(&treadmill, patch).await.unwrap();

        assert_eq!(repo.find_by_category(EquipmentCategory::Cardio).await.unwrap().len(), 1);
        assert_eq!(repo.find_by_category(EquipmentCategory::Strength).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_equipment_is_hidden() {
        let items = catalog();
        let bike = items[1].id().clone();
        let storage = Arc::new(CountingStorage::new(items));
        let repo = CachedRepository::<Equipment>::new(
            storage,
            in_memory_cache(),
            Duration::from_secs(60),
        );

        let patch = EquipmentPatch {
            is_active: Some(false),
            ..Default::default()
        };
        repo.update(&bike, patch).await.unwrap();

        let cardio = repo.find_by_category(EquipmentCategory::Cardio).await.unwrap();
        assert_eq!(cardio.len(), 1);
        assert_eq!(cardio[0].name(), "Treadmill");
    }
}
