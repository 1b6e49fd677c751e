use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::time::Instant;

use crate::models::{ExercisePlanEntry, WorkoutPlan};
use crate::session::phase::SessionPhase;
use crate::session::snapshot::SessionSnapshot;

/// The workout state machine without any timers attached.
///
/// Callers pass the current instant in, so every transition is a plain
/// function of state and time. [`SessionEngine`](crate::session::SessionEngine)
/// wraps this with the rest countdown and elapsed-duration tickers.
///
/// Operations that make no sense in the current phase are no-ops.
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    phase: SessionPhase,
    /// Phase to return to when a pause ends.
    resume_phase: SessionPhase,
    plan: Option<WorkoutPlan>,
    exercise_index: usize,
    current_set: u32,
    rest_remaining: u32,
    elapsed_ms: u64,
    completed_ids: HashSet<String>,
    started_at: Option<Instant>,
    started_wall: Option<DateTime<Utc>>,
    ended_wall: Option<DateTime<Utc>>,
    /// Bumped on every start; identifies which run the state belongs to.
    run: u64,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a run on a fresh copy of `plan`.
    pub fn start(&mut self, plan: &WorkoutPlan, now: Instant, wall: DateTime<Utc>) {
        info!(
            "Starting workout '{}' with {} exercises",
            plan.name,
            plan.exercises.len()
        );
        self.run += 1;
        self.plan = Some(plan.fresh_copy());
        self.exercise_index = 0;
        self.current_set = 1;
        self.rest_remaining = 0;
        self.elapsed_ms = 0;
        self.completed_ids.clear();
        self.started_at = Some(now);
        self.started_wall = Some(wall);
        self.ended_wall = None;
        self.resume_phase = SessionPhase::Active;
        self.phase = SessionPhase::Active;
        self.load_current(now, wall);
    }

    pub fn complete_set(&mut self, now: Instant, wall: DateTime<Utc>) {
        if self.phase != SessionPhase::Active {
            debug!("complete_set ignored in phase {}", self.phase);
            return;
        }
        let Some(entry) = self
            .plan
            .as_mut()
            .and_then(|plan| plan.exercises.get_mut(self.exercise_index))
        else {
            return;
        };

        if entry.actual_reps.len() < self.current_set as usize {
            entry.actual_reps.push(entry.reps);
        }

        if self.current_set < entry.sets.max(1) {
            self.current_set += 1;
            if entry.rest_seconds > 0 {
                self.rest_remaining = entry.rest_seconds;
                self.phase = SessionPhase::Resting;
                debug!(
                    "Set done on '{}', resting {}s before set {}",
                    entry.exercise.name, entry.rest_seconds, self.current_set
                );
            }
            return;
        }

        entry.completed = true;
        if self.completed_ids.insert(entry.exercise.id.clone()) {
            debug!("Exercise '{}' completed", entry.exercise.name);
        } else {
            debug!(
                "Exercise '{}' already counted as completed",
                entry.exercise.name
            );
        }
        self.exercise_index += 1;
        self.load_current(now, wall);
    }

    pub fn skip_rest(&mut self) {
        if self.phase != SessionPhase::Resting {
            return;
        }
        self.rest_remaining = 0;
        self.phase = SessionPhase::Active;
    }

    pub fn pause(&mut self, now: Instant) {
        if !self.phase.is_running() {
            return;
        }
        self.stamp_elapsed(now);
        self.resume_phase = self.phase;
        self.phase = SessionPhase::Paused;
    }

    /// Returns to the phase the pause interrupted. A rest that still has time
    /// left continues counting down from where it stopped.
    pub fn resume(&mut self, now: Instant) {
        if self.phase != SessionPhase::Paused {
            return;
        }
        if self.resume_phase == SessionPhase::Resting && self.rest_remaining > 0 {
            self.phase = SessionPhase::Resting;
        } else {
            self.rest_remaining = 0;
            self.phase = SessionPhase::Active;
        }
        self.stamp_elapsed(now);
    }

    pub fn finish(&mut self, now: Instant, wall: DateTime<Utc>) {
        if matches!(self.phase, SessionPhase::Idle | SessionPhase::Completed) {
            return;
        }
        self.stamp_elapsed(now);
        self.rest_remaining = 0;
        self.ended_wall = Some(wall);
        self.phase = SessionPhase::Completed;
        info!(
            "Workout finished: {}/{} exercises in {}ms",
            self.completed_exercises(),
            self.total_exercises(),
            self.elapsed_ms
        );
    }

    /// Extends a pending rest. Outside a rest there is no countdown to extend.
    pub fn add_rest_time(&mut self, seconds: u32) {
        if !self.rest_pending() {
            debug!("add_rest_time ignored in phase {}", self.phase);
            return;
        }
        self.rest_remaining = self.rest_remaining.saturating_add(seconds);
    }

    /// One second of rest elapsed. Returns whether the rest is still running.
    pub fn rest_tick(&mut self) -> bool {
        if self.phase != SessionPhase::Resting {
            return false;
        }
        self.rest_remaining = self.rest_remaining.saturating_sub(1);
        if self.rest_remaining == 0 {
            self.phase = SessionPhase::Active;
            return false;
        }
        true
    }

    pub fn duration_tick(&mut self, now: Instant) {
        if self.phase.is_running() {
            self.stamp_elapsed(now);
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    pub fn completed_exercises(&self) -> u32 {
        self.completed_ids.len() as u32
    }

    pub fn total_exercises(&self) -> u32 {
        self.plan
            .as_ref()
            .map_or(0, |plan| plan.exercises.len() as u32)
    }

    pub fn plan(&self) -> Option<&WorkoutPlan> {
        self.plan.as_ref()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Number of runs started so far; 0 before the first start.
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn started_wall(&self) -> Option<DateTime<Utc>> {
        self.started_wall
    }

    pub fn ended_wall(&self) -> Option<DateTime<Utc>> {
        self.ended_wall
    }

    pub fn current_exercise(&self) -> Option<&ExercisePlanEntry> {
        self.entry(self.exercise_index)
    }

    pub fn next_exercise(&self) -> Option<&ExercisePlanEntry> {
        self.entry(self.exercise_index + 1)
    }

    pub fn wants_rest_timer(&self) -> bool {
        self.phase == SessionPhase::Resting
    }

    pub fn wants_duration_timer(&self) -> bool {
        self.phase.is_running()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            exercise_index: self.exercise_index,
            current_set: self.current_set,
            rest_remaining_secs: self.rest_remaining,
            elapsed_ms: self.elapsed_ms,
            completed_exercises: self.completed_exercises(),
            total_exercises: self.total_exercises(),
            current_exercise: self.current_exercise().cloned(),
            next_exercise: self.next_exercise().cloned(),
        }
    }

    fn entry(&self, index: usize) -> Option<&ExercisePlanEntry> {
        self.plan.as_ref()?.exercises.get(index)
    }

    fn rest_pending(&self) -> bool {
        match self.phase {
            SessionPhase::Resting => true,
            SessionPhase::Paused => {
                self.resume_phase == SessionPhase::Resting && self.rest_remaining > 0
            }
            _ => false,
        }
    }

    fn load_current(&mut self, now: Instant, wall: DateTime<Utc>) {
        if self.exercise_index < self.total_exercises() as usize {
            self.current_set = 1;
            self.rest_remaining = 0;
            self.phase = SessionPhase::Active;
        } else {
            self.finish(now, wall);
        }
    }

    fn stamp_elapsed(&mut self, now: Instant) {
        if let Some(start) = self.started_at {
            let elapsed = now.saturating_duration_since(start).as_millis();
            self.elapsed_ms = u64::try_from(elapsed).unwrap_or(u64::MAX);
        }
    }
}
