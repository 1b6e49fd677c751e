use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::operations;
use crate::models::{Exercise, WorkoutPlan, WorkoutSessionRecord};

/// Plans and finished sessions.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Saving the same record id again replaces it.
    async fn save_session(&self, user_id: &str, record: &WorkoutSessionRecord) -> Result<()>;
    async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<WorkoutSessionRecord>>;
    async fn session(&self, session_id: &str) -> Result<Option<WorkoutSessionRecord>>;

    async fn save_plan(&self, plan: &WorkoutPlan) -> Result<()>;
    async fn update_plan(&self, plan: &WorkoutPlan) -> Result<()>;
    /// Returns whether a plan was removed.
    async fn delete_plan(&self, plan_id: &str) -> Result<bool>;
    async fn plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>>;
    async fn plans(&self) -> Result<Vec<WorkoutPlan>>;
    async fn custom_plans(&self) -> Result<Vec<WorkoutPlan>>;
}

/// Locally cached exercise catalog.
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    async fn upsert_exercises(&self, exercises: &[Exercise]) -> Result<usize>;
    async fn exercise(&self, exercise_id: &str) -> Result<Option<Exercise>>;
    async fn all_exercises(&self) -> Result<Vec<Exercise>>;
    async fn first_exercises(&self, limit: u32) -> Result<Vec<Exercise>>;
    async fn search_exercises(&self, query: &str, limit: u32) -> Result<Vec<Exercise>>;
    async fn body_parts(&self) -> Result<Vec<String>>;
    async fn exercise_count(&self) -> Result<u64>;
}

/// Both stores over one SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(database_url: &str) -> Result<Self> {
        Ok(Self::new(super::open(database_url).await?))
    }

    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(super::open_in_memory().await?))
    }

    pub async fn reset(&self) -> Result<()> {
        super::drop_all_tables(&self.pool).await
    }
}

#[async_trait]
impl WorkoutStore for SqliteStore {
    async fn save_session(&self, user_id: &str, record: &WorkoutSessionRecord) -> Result<()> {
        operations::save_session(&self.pool, user_id, record).await
    }

    async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<WorkoutSessionRecord>> {
        operations::get_sessions_for_user(&self.pool, user_id).await
    }

    async fn session(&self, session_id: &str) -> Result<Option<WorkoutSessionRecord>> {
        operations::get_session(&self.pool, session_id).await
    }

    async fn save_plan(&self, plan: &WorkoutPlan) -> Result<()> {
        operations::save_plan(&self.pool, plan).await
    }

    async fn update_plan(&self, plan: &WorkoutPlan) -> Result<()> {
        operations::update_plan(&self.pool, plan).await
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<bool> {
        Ok(operations::delete_plan(&self.pool, plan_id).await? > 0)
    }

    async fn plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>> {
        operations::get_plan(&self.pool, plan_id).await
    }

    async fn plans(&self) -> Result<Vec<WorkoutPlan>> {
        operations::get_all_plans(&self.pool).await
    }

    async fn custom_plans(&self) -> Result<Vec<WorkoutPlan>> {
        operations::get_custom_plans(&self.pool).await
    }
}

#[async_trait]
impl ExerciseCatalog for SqliteStore {
    async fn upsert_exercises(&self, exercises: &[Exercise]) -> Result<usize> {
        operations::upsert_exercises(&self.pool, exercises).await
    }

    async fn exercise(&self, exercise_id: &str) -> Result<Option<Exercise>> {
        operations::get_exercise(&self.pool, exercise_id).await
    }

    async fn all_exercises(&self) -> Result<Vec<Exercise>> {
        operations::get_all_exercises(&self.pool).await
    }

    async fn first_exercises(&self, limit: u32) -> Result<Vec<Exercise>> {
        operations::get_exercises_page(&self.pool, limit).await
    }

    async fn search_exercises(&self, query: &str, limit: u32) -> Result<Vec<Exercise>> {
        operations::search_exercises(&self.pool, query, limit).await
    }

    async fn body_parts(&self) -> Result<Vec<String>> {
        operations::get_body_parts(&self.pool).await
    }

    async fn exercise_count(&self) -> Result<u64> {
        operations::count_exercises(&self.pool).await
    }
}
