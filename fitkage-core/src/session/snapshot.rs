use serde::{Deserialize, Serialize};

use crate::models::ExercisePlanEntry;
use crate::session::phase::SessionPhase;

/// Everything a UI needs to render the running session, emitted on every
/// transition and timer tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub exercise_index: usize,
    pub current_set: u32,
    pub rest_remaining_secs: u32,
    pub elapsed_ms: u64,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub current_exercise: Option<ExercisePlanEntry>,
    pub next_exercise: Option<ExercisePlanEntry>,
}

impl SessionSnapshot {
    pub fn progress_label(&self) -> String {
        format!(
            "{}/{} exercises completed",
            self.completed_exercises, self.total_exercises
        )
    }
}
