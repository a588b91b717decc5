//! Workout plan list filter and cache wiring

use std::cmp::Ordering;

use serde::Deserialize;

use super::entity::{
    PlanGoal, PlanId, PlanRelation, WorkoutPlan, WorkoutPlanDraft, WorkoutPlanPatch,
};
use crate::domain::DomainError;
use crate::domain::cache::key::{self, KeyField, KeyedFilter};
use crate::domain::query::{Page, SortOrder, comma_separated, contains_ignore_case};
use crate::domain::resource::{Resource, ResourceFilter};
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSortField {
    Name,
    Weeks,
    CreatedAt,
    UpdatedAt,
}

impl std::fmt::Display for PlanSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Weeks => "weeks",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        })
    }
}

/// Query over workout plans
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkoutPlanFilter {
    #[serde(deserialize_with = "comma_separated")]
    pub ids: Option<Vec<PlanId>>,
    pub user_id: Option<UserId>,
    #[serde(deserialize_with = "comma_separated")]
    pub goals: Option<Vec<PlanGoal>>,
    pub public: Option<bool>,
    pub q: Option<String>,
    pub sort_by: Option<PlanSortField>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    #[serde(deserialize_with = "comma_separated")]
    pub include: Option<Vec<PlanRelation>>,
}

impl std::str::FromStr for PlanGoal {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strength" => Ok(Self::Strength),
            "hypertrophy" => Ok(Self::Hypertrophy),
            "endurance" => Ok(Self::Endurance),
            "weight_loss" => Ok(Self::WeightLoss),
            "mobility" => Ok(Self::Mobility),
            other => Err(DomainError::validation(format!("Unknown plan goal '{}'", other))),
        }
    }
}

impl KeyedFilter for WorkoutPlanFilter {
    const KEY_FIELDS: &'static [KeyField<Self>] = &[
        KeyField {
            name: "ids",
            serialize: |f| key::list(&f.ids),
        },
        KeyField {
            name: "user",
            serialize: |f| key::display(&f.user_id),
        },
        KeyField {
            name: "goals",
            serialize: |f| key::list(&f.goals),
        },
        KeyField {
            name: "public",
            serialize: |f| key::display(&f.public),
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

impl ResourceFilter<WorkoutPlan> for WorkoutPlanFilter {
    fn matches(&self, plan: &WorkoutPlan) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(plan.id()) {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if plan.user_id() != user_id {
                return false;
            }
        }
        if let Some(goals) = &self.goals {
            if !goals.contains(&plan.goal()) {
                return false;
            }
        }
        if let Some(public) = self.public {
            if plan.is_public() != public {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !contains_ignore_case(plan.name(), q) {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &WorkoutPlan, b: &WorkoutPlan) -> Ordering {
        let ordering = match self.sort_by.unwrap_or(PlanSortField::CreatedAt) {
            PlanSortField::Name => a.name().cmp(b.name()),
            PlanSortField::Weeks => a.weeks().cmp(&b.weeks()),
            PlanSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            PlanSortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        };
        self.order
            .unwrap_or_default()
            .apply(ordering.then_with(|| a.id().cmp(b.id())))
    }

    fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }

    fn includes(&self) -> &[PlanRelation] {
        self.include.as_deref().unwrap_or(&[])
    }
}

impl Resource for WorkoutPlan {
    const NAME: &'static str = "workout_plan";

    type Filter = WorkoutPlanFilter;
    type Relation = PlanRelation;
    type Draft = WorkoutPlanDraft;
    type Patch = WorkoutPlanPatch;

    fn from_draft(draft: WorkoutPlanDraft) -> Result<Self, DomainError> {
        draft.build()
    }

    fn apply_patch(&mut self, patch: WorkoutPlanPatch) -> Result<(), DomainError> {
        patch.apply_to(self)
    }

    fn retain_relations(&mut self, include: &[PlanRelation]) {
        self.keep_relations(include);
    }
}
