use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::models::{ExerciseRow, WorkoutPlanRow, WorkoutSessionRow, to_millis};
use crate::models::{Exercise, WorkoutPlan, WorkoutSessionRecord};

const EXERCISE_COLUMNS: &str =
    "id, name, body_part, equipment, gif_url, target, muscle_group, instructions";
const PLAN_COLUMNS: &str =
    "id, name, description, exercises, total_duration_ms, difficulty, created_at, is_custom";
const SESSION_COLUMNS: &str = "id, user_id, plan, started_at, ended_at, total_duration_ms, \
     completed_exercises, total_exercises, calories_burned, rating, notes";

fn into_exercises(rows: Vec<ExerciseRow>) -> Result<Vec<Exercise>> {
    rows.into_iter().map(Exercise::try_from).collect()
}

fn into_plans(rows: Vec<WorkoutPlanRow>) -> Result<Vec<WorkoutPlan>> {
    rows.into_iter().map(WorkoutPlan::try_from).collect()
}

// Exercises
/// Inserts or replaces all `exercises` in one transaction.
pub async fn upsert_exercises(pool: &SqlitePool, exercises: &[Exercise]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    for exercise in exercises {
        sqlx::query(&format!(
            "INSERT OR REPLACE INTO exercises ({EXERCISE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ))
        .bind(&exercise.id)
        .bind(&exercise.name)
        .bind(&exercise.body_part)
        .bind(&exercise.equipment)
        .bind(&exercise.gif_url)
        .bind(&exercise.target)
        .bind(&exercise.muscle_group)
        .bind(serde_json::to_string(&exercise.instructions)?)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(exercises.len())
}

pub async fn get_exercise(pool: &SqlitePool, exercise_id: &str) -> Result<Option<Exercise>> {
    sqlx::query_as::<_, ExerciseRow>(&format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = ?1"
    ))
    .bind(exercise_id)
    .fetch_optional(pool)
    .await?
    .map(Exercise::try_from)
    .transpose()
}

pub async fn get_all_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>> {
    let rows = sqlx::query_as::<_, ExerciseRow>(&format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    into_exercises(rows)
}

pub async fn get_exercises_page(pool: &SqlitePool, limit: u32) -> Result<Vec<Exercise>> {
    let rows = sqlx::query_as::<_, ExerciseRow>(&format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises ORDER BY name LIMIT ?1"
    ))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    into_exercises(rows)
}

/// Case-insensitive substring match on name, body part or target.
pub async fn search_exercises(pool: &SqlitePool, query: &str, limit: u32) -> Result<Vec<Exercise>> {
    let rows = sqlx::query_as::<_, ExerciseRow>(&format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises
         WHERE lower(name) LIKE '%' || lower(?1) || '%'
            OR lower(body_part) LIKE '%' || lower(?1) || '%'
            OR lower(coalesce(target, '')) LIKE '%' || lower(?1) || '%'
         ORDER BY name
         LIMIT ?2"
    ))
    .bind(query)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    into_exercises(rows)
}

pub async fn get_body_parts(pool: &SqlitePool) -> Result<Vec<String>> {
    let parts = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT body_part FROM exercises WHERE body_part != '' ORDER BY body_part",
    )
    .fetch_all(pool)
    .await?;
    Ok(parts)
}

pub async fn count_exercises(pool: &SqlitePool) -> Result<u64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exercises")
        .fetch_one(pool)
        .await?;
    Ok(u64::try_from(count).unwrap_or_default())
}

// Plans
/// Inserts the plan, replacing any plan with the same id.
pub async fn save_plan(pool: &SqlitePool, plan: &WorkoutPlan) -> Result<()> {
    sqlx::query(&format!(
        "INSERT OR REPLACE INTO workout_plans ({PLAN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ))
    .bind(&plan.id)
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(serde_json::to_string(&plan.exercises)?)
    .bind(i64::try_from(plan.total_duration_ms).unwrap_or(i64::MAX))
    .bind(&plan.difficulty)
    .bind(to_millis(plan.created_at))
    .bind(plan.is_custom)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rewrites an existing plan. Errors when no plan has that id.
pub async fn update_plan(pool: &SqlitePool, plan: &WorkoutPlan) -> Result<()> {
    let result = sqlx::query(
        "UPDATE workout_plans
         SET name = ?2, description = ?3, exercises = ?4, total_duration_ms = ?5,
             difficulty = ?6, is_custom = ?7
         WHERE id = ?1",
    )
    .bind(&plan.id)
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(serde_json::to_string(&plan.exercises)?)
    .bind(i64::try_from(plan.total_duration_ms).unwrap_or(i64::MAX))
    .bind(&plan.difficulty)
    .bind(plan.is_custom)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(anyhow::anyhow!("Workout plan {} not found", plan.id));
    }
    Ok(())
}

pub async fn delete_plan(pool: &SqlitePool, plan_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM workout_plans WHERE id = ?1")
        .bind(plan_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn get_plan(pool: &SqlitePool, plan_id: &str) -> Result<Option<WorkoutPlan>> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        "SELECT {PLAN_COLUMNS} FROM workout_plans WHERE id = ?1"
    ))
    .bind(plan_id)
    .fetch_optional(pool)
    .await?
    .map(WorkoutPlan::try_from)
    .transpose()
}

pub async fn get_all_plans(pool: &SqlitePool) -> Result<Vec<WorkoutPlan>> {
    let rows = sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        "SELECT {PLAN_COLUMNS} FROM workout_plans ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    into_plans(rows)
}

pub async fn get_custom_plans(pool: &SqlitePool) -> Result<Vec<WorkoutPlan>> {
    let rows = sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        "SELECT {PLAN_COLUMNS} FROM workout_plans WHERE is_custom = 1 ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    into_plans(rows)
}

// Sessions
/// Upserts by record id, so saving the same summary again updates it.
pub async fn save_session(
    pool: &SqlitePool,
    user_id: &str,
    record: &WorkoutSessionRecord,
) -> Result<()> {
    sqlx::query(&format!(
        "INSERT OR REPLACE INTO workout_sessions ({SESSION_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ))
    .bind(&record.id)
    .bind(user_id)
    .bind(serde_json::to_string(&record.plan)?)
    .bind(to_millis(record.started_at))
    .bind(to_millis(record.ended_at))
    .bind(i64::try_from(record.total_duration_ms).unwrap_or(i64::MAX))
    .bind(i64::from(record.completed_exercises))
    .bind(i64::from(record.total_exercises))
    .bind(i64::from(record.calories_burned))
    .bind(i64::from(record.rating))
    .bind(&record.notes)
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first.
pub async fn get_sessions_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<WorkoutSessionRecord>> {
    let rows = sqlx::query_as::<_, WorkoutSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE user_id = ?1 ORDER BY started_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(WorkoutSessionRecord::try_from).collect()
}

pub async fn get_session(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Option<WorkoutSessionRecord>> {
    sqlx::query_as::<_, WorkoutSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = ?1"
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await?
    .map(WorkoutSessionRecord::try_from)
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::ExerciseSettings;
    use chrono::{Duration, Utc};

    fn catalog() -> Vec<Exercise> {
        let mut bench = Exercise::new("0025", "barbell bench press", "chest");
        bench.target = Some("pectorals".into());
        bench.instructions = vec!["Lie on the bench".into()];
        let mut curl = Exercise::new("0031", "dumbbell curl", "upper arms");
        curl.target = Some("biceps".into());
        let squat = Exercise::new("0043", "barbell full squat", "upper legs");
        vec![bench, curl, squat]
    }

    fn record(id: &str, started_mins_ago: i64) -> WorkoutSessionRecord {
        let started_at = Utc::now() - Duration::minutes(started_mins_ago);
        WorkoutSessionRecord {
            id: id.into(),
            plan: WorkoutPlan::new("history plan"),
            started_at,
            ended_at: started_at + Duration::minutes(20),
            total_duration_ms: 20 * 60_000,
            completed_exercises: 2,
            total_exercises: 3,
            calories_burned: 160,
            rating: 0,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn exercises_upsert_and_search() {
        let pool = open_in_memory().await.unwrap();
        assert_eq!(upsert_exercises(&pool, &catalog()).await.unwrap(), 3);
        assert_eq!(upsert_exercises(&pool, &catalog()).await.unwrap(), 3);
        assert_eq!(count_exercises(&pool).await.unwrap(), 3);

        let found = search_exercises(&pool, "BARBELL", 50).await.unwrap();
        assert_eq!(found.len(), 2);
        let by_target = search_exercises(&pool, "bicep", 50).await.unwrap();
        assert_eq!(by_target[0].id, "0031");
        assert_eq!(search_exercises(&pool, "barbell", 1).await.unwrap().len(), 1);

        let bench = get_exercise(&pool, "0025").await.unwrap().unwrap();
        assert_eq!(bench.instructions, vec!["Lie on the bench"]);
        assert!(get_exercise(&pool, "missing").await.unwrap().is_none());

        assert_eq!(
            get_body_parts(&pool).await.unwrap(),
            vec!["chest", "upper arms", "upper legs"]
        );
        assert_eq!(get_exercises_page(&pool, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn plan_crud() {
        let pool = open_in_memory().await.unwrap();
        let mut custom = WorkoutPlan::new_custom("Push").unwrap();
        custom
            .add_exercise(catalog().remove(0), ExerciseSettings::default())
            .unwrap();
        let stock = WorkoutPlan::new("Starter");
        save_plan(&pool, &custom).await.unwrap();
        save_plan(&pool, &stock).await.unwrap();

        assert_eq!(get_all_plans(&pool).await.unwrap().len(), 2);
        let customs = get_custom_plans(&pool).await.unwrap();
        assert_eq!(customs.len(), 1);
        assert_eq!(customs[0].exercises[0].exercise.id, "0025");

        custom.description = "chest day".into();
        update_plan(&pool, &custom).await.unwrap();
        let loaded = get_plan(&pool, &custom.id).await.unwrap().unwrap();
        assert_eq!(loaded.description, "chest day");
        assert_eq!(
            loaded.created_at.timestamp_millis(),
            custom.created_at.timestamp_millis()
        );

        assert!(update_plan(&pool, &WorkoutPlan::new("ghost")).await.is_err());
        assert_eq!(delete_plan(&pool, &custom.id).await.unwrap(), 1);
        assert_eq!(delete_plan(&pool, &custom.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sessions_are_upserted_and_listed_newest_first() {
        let pool = open_in_memory().await.unwrap();
        let older = record("older", 120);
        let mut newer = record("newer", 10);
        save_session(&pool, "alice", &older).await.unwrap();
        save_session(&pool, "alice", &newer).await.unwrap();
        save_session(&pool, "bob", &record("other", 5)).await.unwrap();

        newer.rating = 4;
        newer.notes = "felt strong".into();
        save_session(&pool, "alice", &newer).await.unwrap();

        let history = get_sessions_for_user(&pool, "alice").await.unwrap();
        let ids: Vec<_> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
        assert_eq!(history[0].rating, 4);
        assert_eq!(history[0].notes, "felt strong");

        let loaded = get_session(&pool, "older").await.unwrap().unwrap();
        assert_eq!(loaded.calories_burned, 160);
        assert_eq!(loaded.plan.name, "history plan");
    }

    #[tokio::test]
    async fn reset_clears_rows() {
        let pool = open_in_memory().await.unwrap();
        upsert_exercises(&pool, &catalog()).await.unwrap();
        save_session(&pool, "alice", &record("s", 1)).await.unwrap();
        crate::db::drop_all_tables(&pool).await.unwrap();
        assert_eq!(count_exercises(&pool).await.unwrap(), 0);
        assert!(get_sessions_for_user(&pool, "alice").await.unwrap().is_empty());
    }
}
