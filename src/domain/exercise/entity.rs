//! Exercise catalog entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::equipment::EquipmentId;
use crate::domain::validation::{ValidationError, validate_text};
use crate::domain::{DomainError, StorageEntity};

crate::entity_id!(
    /// Exercise identifier
    ExerciseId,
    "exercise"
);

crate::relation_enum!(
    /// Heavy parts of an exercise loaded on request
    ExerciseRelation {
        Instructions => "instructions",
        Media => "media",
    }
);

const MAX_NAME_LENGTH: usize = 120;
const MAX_INSTRUCTION_LENGTH: usize = 500;
const MAX_INSTRUCTIONS: usize = 30;

/// Muscle group targeted by an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Arms,
    Core,
    Legs,
    Glutes,
    FullBody,
}

impl MuscleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chest => "chest",
            Self::Back => "back",
            Self::Shoulders => "shoulders",
            Self::Arms => "arms",
            Self::Core => "core",
            Self::Legs => "legs",
            Self::Glutes => "glutes",
            Self::FullBody => "full_body",
        }
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MuscleGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chest" => Ok(Self::Chest),
            "back" => Ok(Self::Back),
            "shoulders" => Ok(Self::Shoulders),
            "arms" => Ok(Self::Arms),
            "core" => Ok(Self::Core),
            "legs" => Ok(Self::Legs),
            "glutes" => Ok(Self::Glutes),
            "full_body" => Ok(Self::FullBody),
            other => Err(DomainError::validation(format!(
                "Unknown muscle group '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Image or video demonstrating an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMedia {
    pub kind: MediaKind,
    pub url: String,
}

/// An exercise in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    id: ExerciseId,
    name: String,
    muscle_groups: Vec<MuscleGroup>,
    difficulty: Difficulty,
    #[serde(default)]
    equipment_ids: Vec<EquipmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instructions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<Vec<ExerciseMedia>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseDraft {
    pub name: String,
    pub muscle_groups: Vec<MuscleGroup>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub equipment_ids: Vec<EquipmentId>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub media: Vec<ExerciseMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub muscle_groups: Option<Vec<MuscleGroup>>,
    pub difficulty: Option<Difficulty>,
    pub equipment_ids: Option<Vec<EquipmentId>>,
    pub instructions: Option<Vec<String>>,
    pub media: Option<Vec<ExerciseMedia>>,
}

impl Exercise {
    pub fn new(
        name: impl Into<String>,
        muscle_groups: Vec<MuscleGroup>,
        difficulty: Difficulty,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        let exercise = Self {
            id: ExerciseId::generate(),
            name: name.into(),
            muscle_groups,
            difficulty,
            equipment_ids: Vec::new(),
            instructions: Some(Vec::new()),
            media: Some(Vec::new()),
            created_at: now,
            updated_at: now,
        };
        exercise.validate()?;
        Ok(exercise)
    }

    pub fn with_equipment(mut self, equipment_id: EquipmentId) -> Self {
        self.equipment_ids.push(equipment_id);
        self
    }

    pub fn with_instructions(mut self, steps: Vec<String>) -> Self {
        self.instructions = Some(steps);
        self
    }

    pub fn id(&self) -> &ExerciseId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn muscle_groups(&self) -> &[MuscleGroup] {
        &self.muscle_groups
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn equipment_ids(&self) -> &[EquipmentId] {
        &self.equipment_ids
    }

    pub fn instructions(&self) -> Option<&[String]> {
        self.instructions.as_deref()
    }

    pub fn media(&self) -> Option<&[ExerciseMedia]> {
        self.media.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn keep_relations(&mut self, include: &[ExerciseRelation]) {
        if !include.contains(&ExerciseRelation::Instructions) {
            self.instructions = None;
        }
        if !include.contains(&ExerciseRelation::Media) {
            self.media = None;
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        if self.muscle_groups.is_empty() {
            return Err(ValidationError::EmptyField("muscle_groups").into());
        }
        if let Some(steps) = &self.instructions {
            if steps.len() > MAX_INSTRUCTIONS {
                return Err(ValidationError::Invalid {
                    field: "instructions",
                    reason: format!("at most {} steps are allowed", MAX_INSTRUCTIONS),
                }
                .into());
            }
            for step in steps {
                validate_text("instructions", step, MAX_INSTRUCTION_LENGTH)?;
            }
        }
        if let Some(media) = &self.media {
            for item in media {
                if !(item.url.starts_with("https://") || item.url.starts_with("http://")) {
                    return Err(ValidationError::Invalid {
                        field: "media",
                        reason: format!("'{}' is not an http(s) URL", item.url),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for Exercise {
    type Key = ExerciseId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl ExerciseDraft {
    pub(crate) fn build(self) -> Result<Exercise, DomainError> {
        let mut exercise = Exercise::new(self.name, self.muscle_groups, self.difficulty)?;
        exercise.equipment_ids = self.equipment_ids;
        exercise.instructions = Some(self.instructions);
        exercise.media = Some(self.media);
        exercise.validate()?;
        Ok(exercise)
    }
}

impl ExercisePatch {
    pub(crate) fn apply_to(self, exercise: &mut Exercise) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            exercise.name = name;
        }
        if let Some(groups) = self.muscle_groups {
            exercise.muscle_groups = groups;
        }
        if let Some(difficulty) = self.difficulty {
            exercise.difficulty = difficulty;
        }
        if let Some(equipment_ids) = self.equipment_ids {
            exercise.equipment_ids = equipment_ids;
        }
        if let Some(instructions) = self.instructions {
            exercise.instructions = Some(instructions);
        }
        if let Some(media) = self.media {
            exercise.media = Some(media);
        }
        exercise.validate()?;
        exercise.touch();
        Ok(())
    }
}
