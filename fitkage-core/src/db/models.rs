//! Row types as stored in SQLite and their conversions to domain types.
//!
//! Timestamps are epoch milliseconds; nested collections are JSON text.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{Exercise, WorkoutPlan, WorkoutSessionRecord};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExerciseRow {
    pub id: String,
    pub name: String,
    pub body_part: String,
    pub equipment: Option<String>,
    pub gif_url: Option<String>,
    pub target: Option<String>,
    pub muscle_group: Option<String>,
    pub instructions: String,
}

impl TryFrom<ExerciseRow> for Exercise {
    type Error = anyhow::Error;

    fn try_from(row: ExerciseRow) -> Result<Self> {
        let instructions = serde_json::from_str(&row.instructions)
            .with_context(|| format!("Bad instructions for exercise {}", row.id))?;
        Ok(Exercise {
            id: row.id,
            name: row.name,
            body_part: row.body_part,
            equipment: row.equipment,
            gif_url: row.gif_url,
            target: row.target,
            muscle_group: row.muscle_group,
            instructions,
        })
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct WorkoutPlanRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub exercises: String,
    pub total_duration_ms: i64,
    pub difficulty: String,
    pub created_at: i64,
    pub is_custom: bool,
}

impl TryFrom<WorkoutPlanRow> for WorkoutPlan {
    type Error = anyhow::Error;

    fn try_from(row: WorkoutPlanRow) -> Result<Self> {
        let exercises = serde_json::from_str(&row.exercises)
            .with_context(|| format!("Bad exercise list for plan {}", row.id))?;
        Ok(WorkoutPlan {
            exercises,
            created_at: from_millis(row.created_at)?,
            total_duration_ms: u64::try_from(row.total_duration_ms).unwrap_or_default(),
            id: row.id,
            name: row.name,
            description: row.description,
            difficulty: row.difficulty,
            is_custom: row.is_custom,
        })
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct WorkoutSessionRow {
    pub id: String,
    pub user_id: String,
    pub plan: String,
    pub started_at: i64,
    pub ended_at: i64,
    pub total_duration_ms: i64,
    pub completed_exercises: i64,
    pub total_exercises: i64,
    pub calories_burned: i64,
    pub rating: i64,
    pub notes: String,
}

impl TryFrom<WorkoutSessionRow> for WorkoutSessionRecord {
    type Error = anyhow::Error;

    fn try_from(row: WorkoutSessionRow) -> Result<Self> {
        let plan = serde_json::from_str(&row.plan)
            .with_context(|| format!("Bad plan snapshot for session {}", row.id))?;
        Ok(WorkoutSessionRecord {
            plan,
            started_at: from_millis(row.started_at)?,
            ended_at: from_millis(row.ended_at)?,
            total_duration_ms: u64::try_from(row.total_duration_ms).unwrap_or_default(),
            completed_exercises: u32::try_from(row.completed_exercises).unwrap_or_default(),
            total_exercises: u32::try_from(row.total_exercises).unwrap_or_default(),
            calories_burned: u32::try_from(row.calories_burned).unwrap_or_default(),
            rating: u8::try_from(row.rating).unwrap_or_default(),
            id: row.id,
            notes: row.notes,
        })
    }
}

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow::anyhow!("Timestamp out of range: {}", ms))
}
