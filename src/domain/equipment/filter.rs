//! Equipment list filter and cache wiring

use std::cmp::Ordering;

use serde::Deserialize;

use super::entity::{Equipment, EquipmentCategory, EquipmentDraft, EquipmentId, EquipmentPatch};
use crate::domain::DomainError;
use crate::domain::cache::key::{self, KeyField, KeyedFilter};
use crate::domain::query::{Page, SortOrder, comma_separated, contains_ignore_case};
use crate::domain::resource::{NoRelation, Resource, ResourceFilter};

/// Secondary lookup name for equipment by category
pub const CATEGORY_LOOKUP: &str = "category";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSortField {
    Name,
    Category,
    CreatedAt,
}

impl std::fmt::Display for EquipmentSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::CreatedAt => "created_at",
        })
    }
}

/// Query over the equipment catalog
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EquipmentFilter {
    #[serde(deserialize_with = "comma_separated")]
    pub ids: Option<Vec<EquipmentId>>,
    pub category: Option<EquipmentCategory>,
    pub brand: Option<String>,
    pub q: Option<String>,
    pub active: Option<bool>,
    pub sort_by: Option<EquipmentSortField>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EquipmentFilter {
    pub fn by_category(category: EquipmentCategory) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }
}

impl KeyedFilter for EquipmentFilter {
    const KEY_FIELDS: &'static [KeyField<Self>] = &[
        KeyField {
            name: "ids",
            serialize: |f| key::list(&f.ids),
        },
        KeyField {
            name: "cat",
            serialize: |f| key::display(&f.category),
        },
        KeyField {
            name: "brand",
            serialize: |f| key::text(&f.brand),
        },
        KeyField {
            name: "q",
            serialize: |f| key::text(&f.q),
        },
        KeyField {
            name: "active",
            serialize: |f| key::display(&f.active),
        },
        KeyField {
            name: "sort",
            serialize: |f| key::display(&f.sort_by),
        },
        KeyField {
            name: "order",
            serialize: |f| key::display(&f.order),
        },
        KeyField {
            name: "limit",
            serialize: |f| key::display(&f.limit),
        },
        KeyField {
            name: "offset",
            serialize: |f| key::display(&f.offset),
        },
    ];
}

impl ResourceFilter<Equipment> for EquipmentFilter {
    fn matches(&self, equipment: &Equipment) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(equipment.id()) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if equipment.category() != category {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if !equipment
                .brand()
                .is_some_and(|b| b.eq_ignore_ascii_case(brand))
            {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !contains_ignore_case(equipment.name(), q) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if equipment.is_active() != active {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &Equipment, b: &Equipment) -> Ordering {
        let ordering = match self.sort_by.unwrap_or(EquipmentSortField::Name) {
            EquipmentSortField::Name => a.name().cmp(b.name()),
            EquipmentSortField::Category => a
                .category()
                .cmp(&b.category())
                .then_with(|| a.name().cmp(b.name())),
            EquipmentSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        self.order
            .unwrap_or_default()
            .apply(ordering.then_with(|| a.id().cmp(b.id())))
    }

    fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }
}

impl Resource for Equipment {
    const NAME: &'static str = "equipment";

    type Filter = EquipmentFilter;
    type Relation = NoRelation;
    type Draft = EquipmentDraft;
    type Patch = EquipmentPatch;

    fn from_draft(draft: EquipmentDraft) -> Result<Self, DomainError> {
        draft.build()
    }

    fn apply_patch(&mut self, patch: EquipmentPatch) -> Result<(), DomainError> {
        patch.apply_to(self)
    }

    fn secondary_keys(&self) -> Vec<String> {
        vec![Self::KEYS.secondary(CATEGORY_LOOKUP, self.category().as_str())]
    }
}
