//! Exercise list filter and cache wiring

use std::cmp::Ordering;

use serde::Deserialize;

use super::entity::{
    Difficulty, Exercise, ExerciseDraft, ExerciseId, ExercisePatch, ExerciseRelation, MuscleGroup,
};
use crate::domain::DomainError;
use crate::domain::cache::key::{self, KeyField, KeyedFilter};
use crate::domain::equipment::EquipmentId;
use crate::domain::query::{Page, SortOrder, comma_separated, contains_ignore_case};
use crate::domain::resource::{Resource, ResourceFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseSortField {
    Name,
    Difficulty,
    CreatedAt,
}

impl std::fmt::Display for ExerciseSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Difficulty => "difficulty",
            Self::CreatedAt => "created_at",
        })
    }
}

/// Query over the exercise catalog
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExerciseFilter {
    #[serde(deserialize_with = "comma_separated")]
    pub ids: Option<Vec<ExerciseId>>,
    /// Matches exercises hitting any of these groups
    #[serde(deserialize_with = "comma_separated")]
    pub muscle_groups: Option<Vec<MuscleGroup>>,
    pub difficulty: Option<Difficulty>,
    pub equipment_id: Option<EquipmentId>,
    pub q: Option<String>,
    pub sort_by: Option<ExerciseSortField>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    #[serde(deserialize_with = "comma_separated")]
    pub include: Option<Vec<ExerciseRelation>>,
}

impl KeyedFilter for ExerciseFilter {
    const KEY_FIELDS: &'static [KeyField<Self>] = &[
        KeyField {
            name: "ids",
            serialize: |f| key::list(&f.ids),
        },
        KeyField {
            name: "muscles",
            serialize: |f| key::list(&f.muscle_groups),
        },
        KeyField {
            name: "level",
            serialize: |f| key::display(&f.difficulty),
        },
        KeyField {
            name: "equipment",
            serialize: |f| key::display(&f.equipment_id),
        },
        KeyField {
            name: "q",
            serialize: |f| key::text(&f.q),
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
        KeyField {
            name: "include",
            serialize: |f| key::list(&f.include),
        },
    ];
}

impl ResourceFilter<Exercise> for ExerciseFilter {
    fn matches(&self, exercise: &Exercise) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(exercise.id()) {
                return false;
            }
        }
        if let Some(groups) = &self.muscle_groups {
            if !groups.iter().any(|g| exercise.muscle_groups().contains(g)) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if exercise.difficulty() != difficulty {
                return false;
            }
        }
        if let Some(equipment_id) = &self.equipment_id {
            if !exercise.equipment_ids().contains(equipment_id) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !contains_ignore_case(exercise.name(), q) {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &Exercise, b: &Exercise) -> Ordering {
        let ordering = match self.sort_by.unwrap_or(ExerciseSortField::Name) {
            ExerciseSortField::Name => a.name().cmp(b.name()),
            ExerciseSortField::Difficulty => a
                .difficulty()
                .cmp(&b.difficulty())
                .then_with(|| a.name().cmp(b.name())),
            ExerciseSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        self.order
            .unwrap_or_default()
            .apply(ordering.then_with(|| a.id().cmp(b.id())))
    }

    fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }

    fn includes(&self) -> &[ExerciseRelation] {
        self.include.as_deref().unwrap_or(&[])
    }
}

impl Resource for Exercise {
    const NAME: &'static str = "exercise";

    type Filter = ExerciseFilter;
    type Relation = ExerciseRelation;
    type Draft = ExerciseDraft;
    type Patch = ExercisePatch;

    fn from_draft(draft: ExerciseDraft) -> Result<Self, DomainError> {
        draft.build()
    }

    fn apply_patch(&mut self, patch: ExercisePatch) -> Result<(), DomainError> {
        patch.apply_to(self)
    }

    fn retain_relations(&mut self, include: &[ExerciseRelation]) {
        self.keep_relations(include);
    }
}
