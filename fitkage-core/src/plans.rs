//! Building and importing workout plans.

use anyhow::Result;
use log::info;

use crate::db::{ExerciseCatalog, WorkoutStore};
use crate::models::{ExerciseSettings, WorkoutPlan};

/// Creates and stores an empty custom plan.
pub async fn create_custom_plan(
    store: &dyn WorkoutStore,
    name: &str,
    description: &str,
) -> Result<WorkoutPlan> {
    let mut plan = WorkoutPlan::new_custom(name)?;
    plan.description = description.trim().to_string();
    store.save_plan(&plan).await?;
    info!("Created custom plan {} ({})", plan.name, plan.id);
    Ok(plan)
}

/// Appends a catalog exercise to a stored plan.
pub async fn add_exercise_to_plan(
    store: &dyn WorkoutStore,
    catalog: &dyn ExerciseCatalog,
    plan_id: &str,
    exercise_id: &str,
    settings: ExerciseSettings,
) -> Result<WorkoutPlan> {
    let mut plan = store
        .plan(plan_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Workout plan {} not found", plan_id))?;
    let exercise = catalog
        .exercise(exercise_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Exercise {} not found", exercise_id))?;
    plan.add_exercise(exercise, settings)?;
    store.update_plan(&plan).await?;
    Ok(plan)
}

/// Parses a plan from JSON, validates every entry and stores it.
pub async fn import_plan(store: &dyn WorkoutStore, json: &str) -> Result<WorkoutPlan> {
    let plan: WorkoutPlan = serde_json::from_str(json)?;
    if plan.name.trim().is_empty() {
        return Err(crate::models::PlanError::EmptyName.into());
    }
    for entry in &plan.exercises {
        entry.settings().validate()?;
    }
    let plan = plan.fresh_copy();
    store.save_plan(&plan).await?;
    info!(
        "Imported plan {} with {} exercises",
        plan.name,
        plan.exercises.len()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::models::{Exercise, PlanError};

    #[tokio::test]
    async fn build_a_custom_plan_from_the_catalog() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .upsert_exercises(&[Exercise::new("0025", "bench press", "chest")])
            .await
            .unwrap();

        let plan = create_custom_plan(&store, "  Chest day ", " heavy ").await.unwrap();
        assert_eq!(plan.name, "Chest day");
        assert_eq!(plan.description, "heavy");

        let plan = add_exercise_to_plan(&store, &store, &plan.id, "0025", ExerciseSettings::default())
            .await
            .unwrap();
        assert_eq!(plan.exercises.len(), 1);
        assert_eq!(plan.exercises[0].sets, 3);
        assert_eq!(store.custom_plans().await.unwrap()[0].exercises.len(), 1);

        let zero = ExerciseSettings {
            sets: 0,
            ..ExerciseSettings::default()
        };
        let err = add_exercise_to_plan(&store, &store, &plan.id, "0025", zero)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<PlanError>(), Some(&PlanError::ZeroSets));
        assert!(
            add_exercise_to_plan(&store, &store, &plan.id, "nope", ExerciseSettings::default())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(create_custom_plan(&store, "  ", "").await.is_err());
        assert!(store.plans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_validates_and_clears_progress() {
        let store = SqliteStore::in_memory().await.unwrap();
        let json = r#"{
            "id": "starter",
            "name": "Starter",
            "exercises": [
                {"exercise": {"id": "1", "name": "squat", "bodyPart": "legs"},
                 "sets": 3, "reps": 10, "rest_seconds": 90, "completed": true, "actual_reps": [10]}
            ]
        }"#;
        let plan = import_plan(&store, json).await.unwrap();
        assert_eq!(plan.difficulty, "Medium");
        assert!(!plan.exercises[0].completed);
        assert!(store.plan("starter").await.unwrap().is_some());

        let bad = json.replace("\"sets\": 3", "\"sets\": 0");
        assert!(import_plan(&store, &bad).await.is_err());
    }
}
