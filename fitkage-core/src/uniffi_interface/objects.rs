use chrono::{DateTime, Utc};

use crate::catalog::RefreshOutcome;
use crate::models::{Exercise, ExercisePlanEntry, WorkoutPlan, WorkoutSessionRecord};
use crate::session::{SessionPhase, SessionSnapshot};
use crate::uniffi_interface::errors::FitkageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum WorkoutPhase {
    Idle,
    Active,
    Resting,
    Paused,
    Completed,
}

impl From<SessionPhase> for WorkoutPhase {
    fn from(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Idle => WorkoutPhase::Idle,
            SessionPhase::Active => WorkoutPhase::Active,
            SessionPhase::Resting => WorkoutPhase::Resting,
            SessionPhase::Paused => WorkoutPhase::Paused,
            SessionPhase::Completed => WorkoutPhase::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ExerciseRecord {
    pub id: String,
    pub name: String,
    pub body_part: String,
    pub equipment: Option<String>,
    pub gif_url: Option<String>,
    pub target: Option<String>,
    pub muscle_group: Option<String>,
    pub instructions: Vec<String>,
}

impl From<Exercise> for ExerciseRecord {
    fn from(e: Exercise) -> Self {
        ExerciseRecord {
            id: e.id,
            name: e.name,
            body_part: e.body_part,
            equipment: e.equipment,
            gif_url: e.gif_url,
            target: e.target,
            muscle_group: e.muscle_group,
            instructions: e.instructions,
        }
    }
}

impl From<ExerciseRecord> for Exercise {
    fn from(r: ExerciseRecord) -> Self {
        Exercise {
            id: r.id,
            name: r.name,
            body_part: r.body_part,
            equipment: r.equipment,
            gif_url: r.gif_url,
            target: r.target,
            muscle_group: r.muscle_group,
            instructions: r.instructions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PlanEntryRecord {
    pub exercise: ExerciseRecord,
    pub sets: u32,
    pub reps: u32,
    pub rest_seconds: u32,
    pub completed: bool,
    pub actual_reps: Vec<u32>,
}

impl From<ExercisePlanEntry> for PlanEntryRecord {
    fn from(e: ExercisePlanEntry) -> Self {
        PlanEntryRecord {
            exercise: e.exercise.into(),
            sets: e.sets,
            reps: e.reps,
            rest_seconds: e.rest_seconds,
            completed: e.completed,
            actual_reps: e.actual_reps,
        }
    }
}

impl From<PlanEntryRecord> for ExercisePlanEntry {
    fn from(r: PlanEntryRecord) -> Self {
        ExercisePlanEntry {
            exercise: r.exercise.into(),
            sets: r.sets,
            reps: r.reps,
            rest_seconds: r.rest_seconds,
            completed: r.completed,
            actual_reps: r.actual_reps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct WorkoutPlanRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub exercises: Vec<PlanEntryRecord>,
    pub total_duration_ms: u64,
    pub difficulty: String,
    pub created_at_ms: i64,
    pub is_custom: bool,
}

impl From<WorkoutPlan> for WorkoutPlanRecord {
    fn from(p: WorkoutPlan) -> Self {
        WorkoutPlanRecord {
            id: p.id,
            name: p.name,
            description: p.description,
            exercises: p.exercises.into_iter().map(Into::into).collect(),
            total_duration_ms: p.total_duration_ms,
            difficulty: p.difficulty,
            created_at_ms: p.created_at.timestamp_millis(),
            is_custom: p.is_custom,
        }
    }
}

impl TryFrom<WorkoutPlanRecord> for WorkoutPlan {
    type Error = FitkageError;

    fn try_from(r: WorkoutPlanRecord) -> Result<Self, FitkageError> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(r.created_at_ms)
            .ok_or_else(|| FitkageError::Validation(format!("bad timestamp {}", r.created_at_ms)))?;
        let exercises: Vec<ExercisePlanEntry> = r.exercises.into_iter().map(Into::into).collect();
        for entry in &exercises {
            entry.settings().validate()?;
        }
        Ok(WorkoutPlan {
            id: r.id,
            name: r.name,
            description: r.description,
            exercises,
            total_duration_ms: r.total_duration_ms,
            difficulty: r.difficulty,
            created_at,
            is_custom: r.is_custom,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SnapshotRecord {
    pub phase: WorkoutPhase,
    pub exercise_index: u32,
    pub current_set: u32,
    pub rest_remaining_secs: u32,
    pub elapsed_ms: u64,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub current_exercise: Option<PlanEntryRecord>,
    pub next_exercise: Option<PlanEntryRecord>,
}

impl From<SessionSnapshot> for SnapshotRecord {
    fn from(s: SessionSnapshot) -> Self {
        SnapshotRecord {
            phase: s.phase.into(),
            exercise_index: u32::try_from(s.exercise_index).unwrap_or(u32::MAX),
            current_set: s.current_set,
            rest_remaining_secs: s.rest_remaining_secs,
            elapsed_ms: s.elapsed_ms,
            completed_exercises: s.completed_exercises,
            total_exercises: s.total_exercises,
            current_exercise: s.current_exercise.map(Into::into),
            next_exercise: s.next_exercise.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SessionSummaryRecord {
    pub id: String,
    pub plan: WorkoutPlanRecord,
    pub started_at_ms: i64,
    pub ended_at_ms: i64,
    pub total_duration_ms: u64,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub calories_burned: u32,
    pub rating: u8,
    pub notes: String,
    pub share_text: String,
}

impl From<WorkoutSessionRecord> for SessionSummaryRecord {
    fn from(r: WorkoutSessionRecord) -> Self {
        let share_text = r.share_text();
        SessionSummaryRecord {
            id: r.id,
            plan: r.plan.into(),
            started_at_ms: r.started_at.timestamp_millis(),
            ended_at_ms: r.ended_at.timestamp_millis(),
            total_duration_ms: r.total_duration_ms,
            completed_exercises: r.completed_exercises,
            total_exercises: r.total_exercises,
            calories_burned: r.calories_burned,
            rating: r.rating,
            notes: r.notes,
            share_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum RefreshResult {
    Updated { count: u32 },
    NoResults,
    Unavailable { reason: String },
}

impl From<RefreshOutcome> for RefreshResult {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Updated(count) => RefreshResult::Updated {
                count: u32::try_from(count).unwrap_or(u32::MAX),
            },
            RefreshOutcome::NoResults => RefreshResult::NoResults,
            RefreshOutcome::Unavailable(reason) => RefreshResult::Unavailable { reason },
        }
    }
}
