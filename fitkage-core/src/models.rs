//! Domain types shared by the session engine, the stores and the FFI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: u32 = 12;
pub const DEFAULT_REST_SECONDS: u32 = 60;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("sets must be greater than zero")]
    ZeroSets,
    #[error("reps must be greater than zero")]
    ZeroReps,
    #[error("plan name must not be empty")]
    EmptyName,
    #[error("rating must be between 0 and 5, got {0}")]
    RatingOutOfRange(u8),
}

/// Catalog entry. Field names follow the exercise database API so the same
/// type deserializes remote responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub body_part: String,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub gif_url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>, body_part: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body_part: body_part.into(),
            equipment: None,
            gif_url: None,
            target: None,
            muscle_group: None,
            instructions: Vec::new(),
        }
    }
}

/// Per-exercise targets chosen while building a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSettings {
    pub sets: u32,
    pub reps: u32,
    pub rest_seconds: u32,
}

impl Default for ExerciseSettings {
    fn default() -> Self {
        Self {
            sets: DEFAULT_SETS,
            reps: DEFAULT_REPS,
            rest_seconds: DEFAULT_REST_SECONDS,
        }
    }
}

impl ExerciseSettings {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.sets == 0 {
            return Err(PlanError::ZeroSets);
        }
        if self.reps == 0 {
            return Err(PlanError::ZeroReps);
        }
        Ok(())
    }
}

/// One exercise within a plan. `completed` and `actual_reps` are only
/// written by the session engine during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExercisePlanEntry {
    pub exercise: Exercise,
    pub sets: u32,
    pub reps: u32,
    pub rest_seconds: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub actual_reps: Vec<u32>,
}

impl ExercisePlanEntry {
    pub fn new(exercise: Exercise) -> Self {
        Self::with_settings(exercise, ExerciseSettings::default())
    }

    pub fn with_settings(exercise: Exercise, settings: ExerciseSettings) -> Self {
        Self {
            exercise,
            sets: settings.sets,
            reps: settings.reps,
            rest_seconds: settings.rest_seconds,
            completed: false,
            actual_reps: Vec::new(),
        }
    }

    pub fn settings(&self) -> ExerciseSettings {
        ExerciseSettings {
            sets: self.sets,
            reps: self.reps,
            rest_seconds: self.rest_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<ExercisePlanEntry>,
    #[serde(default)]
    pub total_duration_ms: u64,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_custom: bool,
}

fn default_difficulty() -> String {
    "Medium".to_string()
}

impl WorkoutPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            exercises: Vec::new(),
            total_duration_ms: 0,
            difficulty: default_difficulty(),
            created_at: Utc::now(),
            is_custom: false,
        }
    }

    /// A user-built plan with a fresh id.
    pub fn new_custom(name: &str) -> Result<Self, PlanError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlanError::EmptyName);
        }
        let mut plan = Self::new(name);
        plan.is_custom = true;
        Ok(plan)
    }

    pub fn add_exercise(
        &mut self,
        exercise: Exercise,
        settings: ExerciseSettings,
    ) -> Result<(), PlanError> {
        settings.validate()?;
        self.exercises
            .push(ExercisePlanEntry::with_settings(exercise, settings));
        Ok(())
    }

    /// Copy with all run progress cleared.
    pub fn fresh_copy(&self) -> Self {
        let mut plan = self.clone();
        for entry in &mut plan.exercises {
            entry.completed = false;
            entry.actual_reps.clear();
        }
        plan
    }
}

/// Terminal record of a finished session. Built once, then persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSessionRecord {
    pub id: String,
    pub plan: WorkoutPlan,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub calories_burned: u32,
    /// 0 means unrated.
    pub rating: u8,
    pub notes: String,
}

impl WorkoutSessionRecord {
    pub fn set_rating(&mut self, rating: u8) -> Result<(), PlanError> {
        if rating > MAX_RATING {
            return Err(PlanError::RatingOutOfRange(rating));
        }
        self.rating = rating;
        Ok(())
    }

    pub fn share_text(&self) -> String {
        let rating = if self.rating == 0 {
            "unrated".to_string()
        } else {
            format!("{}/{}", self.rating, MAX_RATING)
        };
        format!(
            "Workout completed!\n\n{}\nDuration: {}\nExercises: {}/{}\nCalories: {}\nRating: {}",
            self.plan.name,
            format_duration_ms(self.total_duration_ms),
            self.completed_exercises,
            self.total_exercises,
            self.calories_burned,
            rating
        )
    }
}

/// `mm:ss`, minutes are not wrapped at the hour.
pub fn format_duration_ms(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}
