//! Workout plans owned by users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::exercise::ExerciseId;
use crate::domain::user::UserId;
use crate::domain::validation::{validate_optional_text, validate_range, validate_text};
use crate::domain::{DomainError, StorageEntity};

crate::entity_id!(
    /// Workout plan identifier
    PlanId,
    "workout plan"
);

crate::relation_enum!(
    /// Parts of a plan loaded on request
    PlanRelation {
        Exercises => "exercises",
    }
);

const MAX_NAME_LENGTH: usize = 120;
const MAX_NOTES_LENGTH: usize = 500;

/// Training goal of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanGoal {
    Strength,
    Hypertrophy,
    Endurance,
    WeightLoss,
    Mobility,
}

impl std::fmt::Display for PlanGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Strength => "strength",
            Self::Hypertrophy => "hypertrophy",
            Self::Endurance => "endurance",
            Self::WeightLoss => "weight_loss",
            Self::Mobility => "mobility",
        })
    }
}

/// One exercise slot within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExercise {
    pub exercise_id: ExerciseId,
    pub sets: u16,
    pub reps: u16,
    #[serde(default)]
    pub rest_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlanExercise {
    fn validate(&self) -> Result<(), DomainError> {
        validate_range("sets", self.sets as f64, 1.0, 20.0)?;
        validate_range("reps", self.reps as f64, 1.0, 200.0)?;
        validate_range("rest_secs", self.rest_secs as f64, 0.0, 900.0)?;
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;
        Ok(())
    }
}

/// A multi-week training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    id: PlanId,
    user_id: UserId,
    name: String,
    goal: PlanGoal,
    weeks: u8,
    is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exercises: Option<Vec<PlanExercise>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutPlanDraft {
    pub user_id: UserId,
    pub name: String,
    pub goal: PlanGoal,
    pub weeks: u8,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub exercises: Vec<PlanExercise>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutPlanPatch {
    pub name: Option<String>,
    pub goal: Option<PlanGoal>,
    pub weeks: Option<u8>,
    pub is_public: Option<bool>,
    pub exercises: Option<Vec<PlanExercise>>,
}

impl WorkoutPlan {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        goal: PlanGoal,
        weeks: u8,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        let plan = Self {
            id: PlanId::generate(),
            user_id,
            name: name.into(),
            goal,
            weeks,
            is_public: false,
            exercises: Some(Vec::new()),
            created_at: now,
            updated_at: now,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn with_exercise(mut self, exercise: PlanExercise) -> Self {
        self.exercises.get_or_insert_with(Vec::new).push(exercise);
        self
    }

    pub fn id(&self) -> &PlanId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goal(&self) -> PlanGoal {
        self.goal
    }

    pub fn weeks(&self) -> u8 {
        self.weeks
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn exercises(&self) -> Option<&[PlanExercise]> {
        self.exercises.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn keep_relations(&mut self, include: &[PlanRelation]) {
        if !include.contains(&PlanRelation::Exercises) {
            self.exercises = None;
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_range("weeks", self.weeks as f64, 1.0, 52.0)?;
        if let Some(exercises) = &self.exercises {
            for exercise in exercises {
                exercise.validate()?;
            }
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for WorkoutPlan {
    type Key = PlanId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl WorkoutPlanDraft {
    pub(crate) fn build(self) -> Result<WorkoutPlan, DomainError> {
        let mut plan = WorkoutPlan::new(self.user_id, self.name, self.goal, self.weeks)?;
        plan.is_public = self.is_public;
        plan.exercises = Some(self.exercises);
        plan.validate()?;
        Ok(plan)
    }
}

impl WorkoutPlanPatch {
    pub(crate) fn apply_to(self, plan: &mut WorkoutPlan) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            plan.name = name;
        }
        if let Some(goal) = self.goal {
            plan.goal = goal;
        }
        if let Some(weeks) = self.weeks {
            plan.weeks = weeks;
        }
        if let Some(is_public) = self.is_public {
            plan.is_public = is_public;
        }
        if let Some(exercises) = self.exercises {
            plan.exercises = Some(exercises);
        }
        plan.validate()?;
        plan.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(sets: u16) -> PlanExercise {
        PlanExercise {
            exercise_id: ExerciseId::generate(),
            sets,
            reps: 10,
            rest_secs: 90,
            notes: None,
        }
    }

    #[test]
    fn test_new_validates_weeks() {
        let user = UserId::generate();
        assert!(WorkoutPlan::new(user.clone(), "Base", PlanGoal::Strength, 0).is_err());
        assert!(WorkoutPlan::new(user, "Base", PlanGoal::Strength, 8).is_ok());
    }

    #[test]
    fn test_draft_validates_slots() {
        let draft = WorkoutPlanDraft {
            user_id: UserId::generate(),
            name: "5x5".to_string(),
            goal: PlanGoal::Strength,
            weeks: 12,
            is_public: true,
            exercises: vec![slot(5), slot(0)],
        };
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_keep_relations() {
        let mut plan = WorkoutPlan::new(UserId::generate(), "Base", PlanGoal::Endurance, 4)
            .unwrap()
            .with_exercise(slot(3));

        assert_eq!(plan.exercises().map(|e| e.len()), Some(1));
        plan.keep_relations(&[]);
        assert!(plan.exercises().is_none());
    }

    #[test]
    fn test_patch() {
        let mut plan =
            WorkoutPlan::new(UserId::generate(), "Base", PlanGoal::Endurance, 4).unwrap();
        WorkoutPlanPatch {
            goal: Some(PlanGoal::Mobility),
            is_public: Some(true),
            ..Default::default()
        }
        .apply_to(&mut plan)
        .unwrap();

        assert_eq!(plan.goal(), PlanGoal::Mobility);
        assert!(plan.is_public());
    }
}
