//! Development catalog of equipment and exercises

use std::sync::Arc;

use tracing::info;

use crate::domain::equipment::{Equipment, EquipmentCategory};
use crate::domain::exercise::{Difficulty, Exercise, MuscleGroup};
use crate::domain::{DomainError, Storage};

/// Built-in catalog: equipment first, exercises referencing it second
pub fn catalog() -> Result<(Vec<Equipment>, Vec<Exercise>), DomainError> {
    let treadmill = Equipment::new("Treadmill", EquipmentCategory::Cardio)?
        .with_brand("Technogym")
        .with_description("Motorized treadmill with incline");
    let rower = Equipment::new("Rowing Machine", EquipmentCategory::Cardio)?.with_brand("Concept2");
    let barbell = Equipment::new("Olympic Barbell", EquipmentCategory::FreeWeights)?;
    let dumbbells = Equipment::new("Dumbbell Set", EquipmentCategory::FreeWeights)?;
    let rack = Equipment::new("Squat Rack", EquipmentCategory::Strength)?;
    let mat = Equipment::new("Yoga Mat", EquipmentCategory::Flexibility)?;
    let bands = Equipment::new("Resistance Bands", EquipmentCategory::Accessories)?;

    let exercises = vec![
        Exercise::new(
            "Back Squat",
            vec![MuscleGroup::Legs, MuscleGroup::Glutes],
            Difficulty::Intermediate,
        )?
            .with_equipment(barbell.id().clone())
            .with_equipment(rack.id().clone())
            .with_instructions(vec![
                "Set the bar at shoulder height".to_string(),
                "Squat until thighs are parallel".to_string(),
                "Drive up through the heels".to_string(),
            ]),
        Exercise::new("Deadlift", vec![MuscleGroup::Back, MuscleGroup::Legs], Difficulty::Advanced)?
            .with_equipment(barbell.id().clone()),
        Exercise::new(
            "Dumbbell Bench Press",
            vec![MuscleGroup::Chest, MuscleGroup::Arms],
            Difficulty::Beginner,
        )?
            .with_equipment(dumbbells.id().clone()),
        Exercise::new("Interval Run", vec![MuscleGroup::FullBody], Difficulty::Beginner)?
            .with_equipment(treadmill.id().clone()),
        Exercise::new(
            "Steady Row",
            vec![MuscleGroup::Back, MuscleGroup::FullBody],
            Difficulty::Beginner,
        )?
            .with_equipment(rower.id().clone()),
        Exercise::new("Plank", vec![MuscleGroup::Core], Difficulty::Beginner)?
            .with_equipment(mat.id().clone()),
        Exercise::new(
            "Banded Pull-Apart",
            vec![MuscleGroup::Shoulders, MuscleGroup::Back],
            Difficulty::Beginner,
        )?
            .with_equipment(bands.id().clone()),
    ];

    let equipment = vec![treadmill, rower, barbell, dumbbells, rack, mat, bands];
    Ok((equipment, exercises))
}

/// Writes the catalog into empty stores; non-empty stores are left alone
pub async fn seed_catalog(
    equipment_store: &Arc<dyn Storage<Equipment>>,
    exercise_store: &Arc<dyn Storage<Exercise>>,
) -> Result<usize, DomainError> {
    if !equipment_store.list().await?.is_empty() || !exercise_store.list().await?.is_empty() {
        info!("Catalog already present, skipping seed");
        return Ok(0);
    }

    let (equipment, exercises) = catalog()?;
    let total = equipment.len() + exercises.len();

    for item in equipment {
        equipment_store.create(item).await?;
    }
    for exercise in exercises {
        exercise_store.create(exercise).await?;
    }

    info!(entries = total, "Seeded equipment and exercise catalog");
    Ok(total)
}
