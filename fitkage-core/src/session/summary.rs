//! Completed-workout summary: rating, notes, persistence and sharing.

use crate::config::EngineConfig;
use crate::models::WorkoutSessionRecord;
use crate::session::calories::calories_burned;
use crate::session::machine::SessionMachine;
use crate::session::{Session, SessionPhase};
use anyhow::Result;
use log::{error, info};
use uuid::Uuid;

/// Record for a machine that reached `Completed`, `None` otherwise.
pub fn build_summary(machine: &SessionMachine, config: &EngineConfig) -> Option<WorkoutSessionRecord> {
    if machine.phase() != SessionPhase::Completed {
        return None;
    }
    let plan = machine.plan()?.clone();
    let started_at = machine.started_wall()?;
    let ended_at = machine.ended_wall().unwrap_or(started_at);
    let total_duration_ms = machine.total_duration_ms();
    Some(WorkoutSessionRecord {
        id: Uuid::new_v4().to_string(),
        plan,
        started_at,
        ended_at,
        total_duration_ms,
        completed_exercises: machine.completed_exercises(),
        total_exercises: machine.total_exercises(),
        calories_burned: calories_burned(total_duration_ms, config.calories_per_minute),
        rating: 0,
        notes: String::new(),
    })
}

/// A built summary and the engine run it was built from.
#[derive(Debug)]
pub(crate) struct CachedSummary {
    run: u64,
    record: WorkoutSessionRecord,
}

impl Session {
    /// Summary of the completed run, built once and then cached.
    pub async fn summary(&self) -> Option<WorkoutSessionRecord> {
        let mut cached = self.summary.lock().await;
        self.current_summary(&mut *cached).cloned()
    }

    /// 0 clears the rating.
    pub async fn set_rating(&self, rating: u8) -> Result<()> {
        self.with_summary(|record| Ok(record.set_rating(rating)?))
            .await
    }

    pub async fn set_notes(&self, notes: &str) -> Result<()> {
        self.with_summary(|record| {
            record.notes = notes.trim().to_string();
            Ok(())
        })
        .await
    }

    /// Persists the summary for this session's user. A failure leaves the
    /// summary in place so the save can be retried.
    pub async fn save_session(&self) -> Result<WorkoutSessionRecord> {
        let record = self
            .summary()
            .await
            .ok_or_else(|| anyhow::anyhow!("No completed workout to save"))?;
        if let Err(e) = self.store.save_session(&self.user_id, &record).await {
            error!("Failed to save workout session {}: {:#}", record.id, e);
            return Err(e);
        }
        info!(
            "Saved workout session {} for user {}",
            record.id, self.user_id
        );
        Ok(record)
    }

    pub async fn share_text(&self) -> Option<String> {
        self.summary().await.map(|record| record.share_text())
    }

    /// Saved sessions of this user, newest first.
    pub async fn history(&self) -> Result<Vec<WorkoutSessionRecord>> {
        self.store.sessions_for_user(&self.user_id).await
    }

    /// A previously saved session by id.
    pub async fn saved_session(&self, session_id: &str) -> Result<Option<WorkoutSessionRecord>> {
        self.store.session(session_id).await
    }

    async fn with_summary(
        &self,
        f: impl FnOnce(&mut WorkoutSessionRecord) -> Result<()>,
    ) -> Result<()> {
        let mut cached = self.summary.lock().await;
        let record = self
            .current_summary(&mut *cached)
            .ok_or_else(|| anyhow::anyhow!("No completed workout"))?;
        f(record)
    }

    /// Brings the cache in line with the engine's current run, rebuilding
    /// it only when the engine moved on to another run.
    fn current_summary<'a>(
        &self,
        cached: &'a mut Option<CachedSummary>,
    ) -> Option<&'a mut WorkoutSessionRecord> {
        let config = *self.engine.config();
        let cached_run = cached.as_ref().map(|c| c.run);
        let rebuilt = self.engine.inspect(|machine| {
            if cached_run == Some(machine.run()) {
                return None;
            }
            Some(
                build_summary(machine, &config)
                    .map(|record| CachedSummary { run: machine.run(), record }),
            )
        });
        if let Some(fresh) = rebuilt {
            *cached = fresh;
        }
        cached.as_mut().map(|c| &mut c.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SqliteStore, WorkoutStore};
    use crate::models::{Exercise, ExerciseSettings, WorkoutPlan};
    use crate::session::SessionEngine;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Delegates to SQLite but can be told to fail session saves.
    struct FlakyStore {
        inner: SqliteStore,
        fail_saves: AtomicBool,
    }

    #[async_trait]
    impl WorkoutStore for FlakyStore {
        async fn save_session(&self, user_id: &str, record: &WorkoutSessionRecord) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(anyhow::anyhow!("disk full"));
            }
            self.inner.save_session(user_id, record).await
        }

        async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<WorkoutSessionRecord>> {
            self.inner.sessions_for_user(user_id).await
        }

        async fn session(&self, session_id: &str) -> Result<Option<WorkoutSessionRecord>> {
            self.inner.session(session_id).await
        }

        async fn save_plan(&self, plan: &WorkoutPlan) -> Result<()> {
            self.inner.save_plan(plan).await
        }

        async fn update_plan(&self, plan: &WorkoutPlan) -> Result<()> {
            self.inner.update_plan(plan).await
        }

        async fn delete_plan(&self, plan_id: &str) -> Result<bool> {
            self.inner.delete_plan(plan_id).await
        }

        async fn plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>> {
            self.inner.plan(plan_id).await
        }

        async fn plans(&self) -> Result<Vec<WorkoutPlan>> {
            self.inner.plans().await
        }

        async fn custom_plans(&self) -> Result<Vec<WorkoutPlan>> {
            self.inner.custom_plans().await
        }
    }

    fn plan() -> WorkoutPlan {
        let mut plan = WorkoutPlan::new_custom("Legs").unwrap();
        for (id, name) in [("squat", "Back squat"), ("lunge", "Walking lunge")] {
            plan.add_exercise(
                Exercise::new(id, name, "upper legs"),
                ExerciseSettings {
                    sets: 1,
                    reps: 8,
                    rest_seconds: 0,
                },
            )
            .unwrap();
        }
        plan
    }

    async fn session(fail_saves: bool) -> (Session, Arc<FlakyStore>) {
        let store = Arc::new(FlakyStore {
            inner: SqliteStore::in_memory().await.unwrap(),
            fail_saves: AtomicBool::new(fail_saves),
        });
        let engine = SessionEngine::with_current_runtime(EngineConfig::default()).unwrap();
        (Session::new(engine, store.clone(), "athlete"), store)
    }

    #[tokio::test]
    async fn summary_reflects_the_finished_run() {
        let (session, _) = session(false).await;
        tokio::time::pause();
        assert!(session.summary().await.is_none());

        session.start_workout(&plan()).await;
        session.complete_set();
        tokio::time::sleep(Duration::from_secs(10 * 60 + 30)).await;
        assert!(session.summary().await.is_none());

        let summary = session.finish_workout().await.unwrap();
        assert_eq!(summary.total_duration_ms, 630_000);
        assert_eq!(summary.calories_burned, 80);
        assert_eq!(summary.completed_exercises, 1);
        assert_eq!(summary.total_exercises, 2);
        assert!(summary.plan.exercises[0].completed);
        assert_eq!(summary.plan.exercises[0].actual_reps, vec![8]);
        assert_eq!(session.summary().await.unwrap().id, summary.id);
    }

    #[tokio::test]
    async fn rating_and_notes_need_a_completed_run() {
        let (session, _) = session(false).await;
        assert!(session.set_rating(3).await.is_err());

        session.start_workout(&plan()).await;
        session.finish_workout().await;
        assert!(session.set_rating(6).await.is_err());
        session.set_rating(5).await.unwrap();
        session.set_notes("  solid  ").await.unwrap();

        let summary = session.summary().await.unwrap();
        assert_eq!(summary.rating, 5);
        assert_eq!(summary.notes, "solid");
        assert!(session.share_text().await.unwrap().contains("Rating: 5/5"));
    }

    #[tokio::test]
    async fn failed_save_keeps_summary_for_retry() {
        let (session, store) = session(true).await;
        session.start_workout(&plan()).await;
        session.complete_set();
        session.complete_set();
        assert_eq!(session.phase(), SessionPhase::Completed);

        let err = session.save_session().await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(session.phase(), SessionPhase::Completed);
        let pending = session.summary().await.unwrap();

        store.fail_saves.store(false, Ordering::SeqCst);
        let saved = session.save_session().await.unwrap();
        assert_eq!(saved.id, pending.id);

        session.set_rating(4).await.unwrap();
        session.save_session().await.unwrap();

        let history = session.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rating, 4);
        assert_eq!(history[0].completed_exercises, 2);

        let stored = session.saved_session(&saved.id).await.unwrap().unwrap();
        assert_eq!(stored.rating, 4);
        assert!(session.saved_session("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restart_discards_previous_summary() {
        let (session, _) = session(false).await;
        session.start_workout(&plan()).await;
        let first = session.finish_workout().await.unwrap();

        session.start_workout(&plan()).await;
        assert!(session.summary().await.is_none());
        let second = session.finish_workout().await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn cached_summary_never_outlives_its_run() {
        let (session, _) = session(false).await;
        session.start_workout(&plan()).await;
        let first = session.finish_workout().await.unwrap();
        assert_eq!(first.completed_exercises, 0);

        // Restart straight on the engine, leaving the first run's summary cached.
        let mut short = WorkoutPlan::new_custom("Arms").unwrap();
        short
            .add_exercise(
                Exercise::new("curl", "Barbell curl", "upper arms"),
                ExerciseSettings {
                    sets: 1,
                    reps: 10,
                    rest_seconds: 0,
                },
            )
            .unwrap();
        session.engine().start_workout(&short);
        assert!(session.summary().await.is_none());
        assert!(session.set_rating(3).await.is_err());

        session.complete_set();
        let second = session.summary().await.unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(second.plan.name, "Arms");
        assert_eq!(second.completed_exercises, 1);

        session.set_rating(3).await.unwrap();
        let saved = session.save_session().await.unwrap();
        assert_eq!(saved.id, second.id);
        assert_eq!(saved.rating, 3);
    }

    #[tokio::test]
    async fn save_without_summary_is_an_error() {
        let (session, _) = session(false).await;
        assert!(session.save_session().await.is_err());
    }
}
