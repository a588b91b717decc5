//! Exercise catalog domain

mod entity;
mod filter;

pub use entity::{
    Difficulty, Exercise, ExerciseDraft, ExerciseId, ExerciseMedia, ExercisePatch,
    ExerciseRelation, MediaKind, MuscleGroup,
};
pub use filter::{ExerciseFilter, ExerciseSortField};
