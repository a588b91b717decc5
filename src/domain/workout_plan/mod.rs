//! Workout plan domain

mod entity;
mod filter;

pub use entity::{
    PlanExercise, PlanGoal, PlanId, PlanRelation, WorkoutPlan, WorkoutPlanDraft, WorkoutPlanPatch,
};
pub use filter::{PlanSortField, WorkoutPlanFilter};
