use crate::catalog::{ExerciseApiClient, ExerciseCatalogService, ExerciseSource};
use crate::config::{EngineConfig, ExerciseApiConfig};
use crate::db::{SqliteStore, WorkoutStore};
use crate::models::{ExerciseSettings, WorkoutPlan};
use crate::plans;
use crate::session::{Session, SessionEngine, SessionSnapshot};
use crate::uniffi_interface::errors::FitkageError;
use crate::uniffi_interface::objects::{
    ExerciseRecord, RefreshResult, SessionSummaryRecord, SnapshotRecord, WorkoutPlanRecord,
};
use log::*;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tokio::runtime::Runtime;
use tokio::sync::{oneshot, watch};

type FfiResult<T> = std::result::Result<T, FitkageError>;

/// Receives every snapshot the engine publishes, starting with the current
/// one. Calls come from a dedicated thread outside the runtime, so a
/// listener may call back into the handle.
#[uniffi::export(callback_interface)]
pub trait SnapshotListener: Send + Sync {
    fn on_snapshot(&self, snapshot: SnapshotRecord);
}

/// Everything a mobile front end needs: the running session, plans, history
/// and the exercise catalog.
#[derive(uniffi::Object)]
pub struct WorkoutSessionHandle {
    runtime: &'static Runtime,
    session: Session,
    store: Arc<SqliteStore>,
    catalog: ExerciseCatalogService,
    /// Dropping the sender stops the listener thread.
    listener_stop: Mutex<Option<oneshot::Sender<()>>>,
}

/// Forwards snapshots to `listener` until `stop` fires or the engine goes
/// away. Waiting happens inside `runtime`, the callback outside of it.
fn forward_snapshots(
    runtime: &'static Runtime,
    mut rx: watch::Receiver<SessionSnapshot>,
    mut stop: oneshot::Receiver<()>,
    listener: Box<dyn SnapshotListener>,
) {
    let first = rx.borrow_and_update().clone();
    listener.on_snapshot(first.into());
    loop {
        let changed = runtime.block_on(async {
            tokio::select! {
                changed = rx.changed() => changed.is_ok(),
                _ = &mut stop => false,
            }
        });
        if !changed {
            break;
        }
        let snapshot = rx.borrow_and_update().clone();
        listener.on_snapshot(snapshot.into());
    }
    debug!("Snapshot listener stopped");
}

fn database_url(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite://{}", path)
    }
}

#[uniffi::export]
impl WorkoutSessionHandle {
    #[uniffi::constructor]
    pub fn new(database_path: String, user_id: String) -> FfiResult<Arc<Self>> {
        let runtime = crate::runtime::init_global_runtime_blocking()?;
        let store = Arc::new(runtime.block_on(SqliteStore::open(&database_url(&database_path)))?);

        let source: Option<Arc<dyn ExerciseSource>> =
            match ExerciseApiClient::new(ExerciseApiConfig::from_env()) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!("Exercise API client unavailable: {:#}", e);
                    None
                }
            };
        let catalog = ExerciseCatalogService::new(store.clone(), source);

        let engine = SessionEngine::new(EngineConfig::from_env(), runtime.handle().clone());
        let session = Session::new(engine, store.clone(), user_id);
        info!("Workout session handle ready for user {}", session.user_id());

        Ok(Arc::new(Self {
            runtime,
            session,
            store,
            catalog,
            listener_stop: Mutex::new(None),
        }))
    }

    // Workout flow

    pub fn start_workout(&self, plan: WorkoutPlanRecord) -> FfiResult<()> {
        let plan = WorkoutPlan::try_from(plan)?;
        self.runtime.block_on(self.session.start_workout(&plan));
        Ok(())
    }

    pub fn start_plan(&self, plan_id: String) -> FfiResult<WorkoutPlanRecord> {
        let plan = self.runtime.block_on(self.session.start_plan(&plan_id))?;
        Ok(plan.into())
    }

    pub fn complete_set(&self) {
        self.session.complete_set();
    }

    pub fn skip_rest(&self) {
        self.session.skip_rest();
    }

    pub fn pause_workout(&self) {
        self.session.pause_workout();
    }

    pub fn resume_workout(&self) {
        self.session.resume_workout();
    }

    pub fn toggle_pause(&self) {
        self.session.toggle_pause();
    }

    pub fn add_rest_time(&self, seconds: u32) {
        self.session.add_rest_time(seconds);
    }

    pub fn extend_rest(&self) {
        self.session.extend_rest();
    }

    pub fn finish_workout(&self) -> Option<SessionSummaryRecord> {
        self.runtime
            .block_on(self.session.finish_workout())
            .map(Into::into)
    }

    pub fn snapshot(&self) -> SnapshotRecord {
        self.session.snapshot().into()
    }

    pub fn completed_exercises(&self) -> u32 {
        self.session.engine().completed_exercises()
    }

    pub fn total_exercises(&self) -> u32 {
        self.session.engine().total_exercises()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.session.engine().total_duration_ms()
    }

    pub fn workout_plan(&self) -> Option<WorkoutPlanRecord> {
        self.session.engine().workout_plan().map(Into::into)
    }

    /// Replaces any previous listener.
    pub fn set_listener(&self, listener: Box<dyn SnapshotListener>) -> FfiResult<()> {
        let rx = self.session.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel();
        let runtime = self.runtime;
        thread::Builder::new()
            .name("fitkage-listener".to_string())
            .spawn(move || forward_snapshots(runtime, rx, stop_rx, listener))
            .map_err(|e| FitkageError::from(format!("Failed to start snapshot listener: {}", e)))?;
        // The previous sender drops here, stopping its thread.
        self.listener_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(stop_tx);
        Ok(())
    }

    /// Never waits for the listener thread, so it is safe to call from
    /// inside a listener.
    pub fn clear_listener(&self) {
        self.listener_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    // Summary

    pub fn summary(&self) -> Option<SessionSummaryRecord> {
        self.runtime.block_on(self.session.summary()).map(Into::into)
    }

    pub fn set_rating(&self, rating: u8) -> FfiResult<()> {
        self.runtime.block_on(self.session.set_rating(rating))?;
        Ok(())
    }

    pub fn set_notes(&self, notes: String) -> FfiResult<()> {
        self.runtime.block_on(self.session.set_notes(&notes))?;
        Ok(())
    }

    /// `false` when there is nothing to save or the store failed; the
    /// summary is kept either way.
    pub fn save_session(&self) -> bool {
        match self.runtime.block_on(self.session.save_session()) {
            Ok(_) => true,
            Err(e) => {
                warn!("save_session failed: {:#}", e);
                false
            }
        }
    }

    pub fn share_text(&self) -> Option<String> {
        self.runtime.block_on(self.session.share_text())
    }

    pub fn history(&self) -> FfiResult<Vec<SessionSummaryRecord>> {
        let records = self.runtime.block_on(self.session.history())?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    // Plans

    pub fn plans(&self) -> FfiResult<Vec<WorkoutPlanRecord>> {
        let plans = self.runtime.block_on(self.store.plans())?;
        Ok(plans.into_iter().map(Into::into).collect())
    }

    pub fn custom_plans(&self) -> FfiResult<Vec<WorkoutPlanRecord>> {
        let plans = self.runtime.block_on(self.store.custom_plans())?;
        Ok(plans.into_iter().map(Into::into).collect())
    }

    pub fn create_custom_plan(&self, name: String, description: String) -> FfiResult<WorkoutPlanRecord> {
        let plan = self.runtime.block_on(plans::create_custom_plan(
            self.store.as_ref(),
            &name,
            &description,
        ))?;
        Ok(plan.into())
    }

    pub fn add_exercise_to_plan(
        &self,
        plan_id: String,
        exercise_id: String,
        sets: u32,
        reps: u32,
        rest_seconds: u32,
    ) -> FfiResult<WorkoutPlanRecord> {
        let settings = ExerciseSettings {
            sets,
            reps,
            rest_seconds,
        };
        let plan = self.runtime.block_on(plans::add_exercise_to_plan(
            self.store.as_ref(),
            self.store.as_ref(),
            &plan_id,
            &exercise_id,
            settings,
        ))?;
        Ok(plan.into())
    }

    pub fn delete_plan(&self, plan_id: String) -> FfiResult<bool> {
        Ok(self.runtime.block_on(self.store.delete_plan(&plan_id))?)
    }

    // Catalog

    pub fn refresh_exercises(&self) -> RefreshResult {
        self.runtime.block_on(self.catalog.refresh()).into()
    }

    pub fn search_exercises(&self, query: String) -> FfiResult<Vec<ExerciseRecord>> {
        let exercises = self.runtime.block_on(self.catalog.search(&query))?;
        Ok(exercises.into_iter().map(Into::into).collect())
    }

    pub fn exercises_by_body_part(&self, body_part: String) -> FfiResult<Vec<ExerciseRecord>> {
        let exercises = self.runtime.block_on(self.catalog.by_body_part(&body_part))?;
        Ok(exercises.into_iter().map(Into::into).collect())
    }

    pub fn body_parts(&self) -> FfiResult<Vec<String>> {
        Ok(self.runtime.block_on(self.catalog.body_parts())?)
    }

    pub fn reset_database(&self) -> FfiResult<()> {
        self.runtime.block_on(self.store.reset())?;
        Ok(())
    }
}

impl Drop for WorkoutSessionHandle {
    fn drop(&mut self) {
        self.clear_listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exercise;
    use crate::uniffi_interface::objects::WorkoutPhase;
    use std::sync::mpsc;
    use std::time::Duration;
    use uuid::Uuid;

    /// Asks the handle for the summary as soon as the run completes.
    struct SummaryOnCompletion {
        handle: Arc<WorkoutSessionHandle>,
        results: Mutex<mpsc::Sender<Option<SessionSummaryRecord>>>,
    }

    impl SnapshotListener for SummaryOnCompletion {
        fn on_snapshot(&self, snapshot: SnapshotRecord) {
            if snapshot.phase == WorkoutPhase::Completed {
                let summary = self.handle.summary();
                let _ = self.results.lock().unwrap().send(summary);
            }
        }
    }

    fn temp_database() -> String {
        std::env::temp_dir()
            .join(format!("fitkage-{}.db", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn paths_become_sqlite_urls() {
        assert_eq!(database_url("/data/fit.db"), "sqlite:///data/fit.db");
        assert_eq!(database_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    fn listener_can_call_back_into_the_handle() {
        let handle = WorkoutSessionHandle::new(temp_database(), "athlete".to_string()).unwrap();
        let (tx, rx) = mpsc::channel();
        handle
            .set_listener(Box::new(SummaryOnCompletion {
                handle: handle.clone(),
                results: Mutex::new(tx),
            }))
            .unwrap();

        let mut plan = WorkoutPlan::new_custom("Quick").unwrap();
        plan.add_exercise(
            Exercise::new("squat", "Back squat", "upper legs"),
            ExerciseSettings {
                sets: 1,
                reps: 5,
                rest_seconds: 0,
            },
        )
        .unwrap();
        handle.start_workout(plan.into()).unwrap();
        handle.complete_set();

        let summary = rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(summary.completed_exercises, 1);
        assert_eq!(summary.total_exercises, 1);
        handle.clear_listener();
    }
}
