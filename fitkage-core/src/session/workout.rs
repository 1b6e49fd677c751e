//! Workout flow operations.

use crate::models::{WorkoutPlan, WorkoutSessionRecord};
use crate::session::{Session, SessionPhase, SessionSnapshot};
use anyhow::Result;
use log::info;
use tokio::sync::watch;

impl Session {
    /// Start (or restart) `plan`, discarding any summary of a previous run.
    pub async fn start_workout(&self, plan: &WorkoutPlan) {
        let mut cached = self.summary.lock().await;
        *cached = None;
        self.engine.start_workout(plan);
    }

    /// Load a stored plan by id and start it.
    pub async fn start_plan(&self, plan_id: &str) -> Result<WorkoutPlan> {
        let plan = self
            .store
            .plan(plan_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workout plan {} not found", plan_id))?;
        info!("User {} starting plan {}", self.user_id, plan.name);
        self.start_workout(&plan).await;
        Ok(plan)
    }

    pub fn complete_set(&self) {
        self.engine.complete_set();
    }

    pub fn skip_rest(&self) {
        self.engine.skip_rest();
    }

    pub fn pause_workout(&self) {
        self.engine.pause_workout();
    }

    pub fn resume_workout(&self) {
        self.engine.resume_workout();
    }

    /// Pause when running, resume when paused.
    pub fn toggle_pause(&self) {
        match self.engine.phase() {
            SessionPhase::Active | SessionPhase::Resting => self.engine.pause_workout(),
            SessionPhase::Paused => self.engine.resume_workout(),
            SessionPhase::Idle | SessionPhase::Completed => {}
        }
    }

    pub fn add_rest_time(&self, seconds: u32) {
        self.engine.add_rest_time(seconds);
    }

    pub fn extend_rest(&self) {
        self.engine.extend_rest();
    }

    /// Finish now and return the summary, if a run was in progress.
    pub async fn finish_workout(&self) -> Option<WorkoutSessionRecord> {
        self.engine.finish_workout();
        self.summary().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.engine.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.engine.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::db::{SqliteStore, WorkoutStore};
    use crate::models::{Exercise, ExerciseSettings};
    use crate::session::SessionEngine;
    use std::sync::Arc;

    async fn session() -> (Session, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let engine = SessionEngine::with_current_runtime(EngineConfig::default()).unwrap();
        (Session::new(engine, store.clone(), "tester"), store)
    }

    fn plan() -> WorkoutPlan {
        let mut plan = WorkoutPlan::new_custom("Pull").unwrap();
        plan.add_exercise(
            Exercise::new("row", "Cable row", "back"),
            ExerciseSettings {
                sets: 2,
                reps: 10,
                rest_seconds: 30,
            },
        )
        .unwrap();
        plan
    }

    #[tokio::test]
    async fn toggle_pause_flips_between_running_and_paused() {
        let (session, _) = session().await;
        session.toggle_pause();
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.start_workout(&plan()).await;
        session.complete_set();
        session.toggle_pause();
        assert_eq!(session.phase(), SessionPhase::Paused);
        session.toggle_pause();
        assert_eq!(session.phase(), SessionPhase::Resting);
    }

    #[tokio::test]
    async fn start_plan_loads_from_store() {
        let (session, store) = session().await;
        let plan = plan();
        store.save_plan(&plan).await.unwrap();

        let started = session.start_plan(&plan.id).await.unwrap();
        assert_eq!(started.id, plan.id);
        assert_eq!(session.snapshot().total_exercises, 1);
        assert!(session.start_plan("missing").await.is_err());
    }

    #[tokio::test]
    async fn finish_returns_summary_once_started() {
        let (session, _) = session().await;
        assert!(session.finish_workout().await.is_none());

        session.start_workout(&plan()).await;
        let summary = session.finish_workout().await.unwrap();
        assert_eq!(summary.total_exercises, 1);
        assert_eq!(summary.completed_exercises, 0);
    }
}
