//! Timer-driven wrapper around [`SessionMachine`].
//!
//! All transitions happen under one mutex. After every transition the engine
//! reconciles the two tickers against the new phase and publishes a fresh
//! [`SessionSnapshot`] on a watch channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anyhow::Result;
use chrono::Utc;
use log::debug;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::models::WorkoutPlan;
use crate::session::machine::SessionMachine;
use crate::session::phase::SessionPhase;
use crate::session::snapshot::SessionSnapshot;
use crate::session::timer::{TICK_INTERVAL, Ticker, TimerRole};

#[derive(Default)]
struct EngineState {
    machine: SessionMachine,
    rest_timer: Option<Ticker>,
    duration_timer: Option<Ticker>,
}

impl EngineState {
    fn timer(&self, role: TimerRole) -> &Option<Ticker> {
        match role {
            TimerRole::Rest => &self.rest_timer,
            TimerRole::Duration => &self.duration_timer,
        }
    }

    fn timer_mut(&mut self, role: TimerRole) -> &mut Option<Ticker> {
        match role {
            TimerRole::Rest => &mut self.rest_timer,
            TimerRole::Duration => &mut self.duration_timer,
        }
    }

    fn wants(&self, role: TimerRole) -> bool {
        match role {
            TimerRole::Rest => self.machine.wants_rest_timer(),
            TimerRole::Duration => self.machine.wants_duration_timer(),
        }
    }
}

struct Shared {
    state: Mutex<EngineState>,
    snapshots: watch::Sender<SessionSnapshot>,
    config: EngineConfig,
    runtime: Handle,
    next_timer_id: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheap to clone; clones drive the same session.
#[derive(Clone)]
pub struct SessionEngine {
    shared: Arc<Shared>,
}

impl SessionEngine {
    /// Tickers are spawned on `runtime`.
    pub fn new(config: EngineConfig, runtime: Handle) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState::default()),
                snapshots,
                config,
                runtime,
                next_timer_id: AtomicU64::new(1),
            }),
        }
    }

    /// Uses the runtime of the calling task.
    pub fn with_current_runtime(config: EngineConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("No tokio runtime for the session engine: {}", e))?;
        Ok(Self::new(config, runtime))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Starts `plan` from the top. Any previous run is discarded.
    pub fn start_workout(&self, plan: &WorkoutPlan) {
        self.transition(|state| {
            state.rest_timer = None;
            state.duration_timer = None;
            state.machine.start(plan, Instant::now(), Utc::now());
        });
    }

    pub fn complete_set(&self) {
        self.transition(|state| state.machine.complete_set(Instant::now(), Utc::now()));
    }

    pub fn skip_rest(&self) {
        self.transition(|state| state.machine.skip_rest());
    }

    pub fn pause_workout(&self) {
        self.transition(|state| state.machine.pause(Instant::now()));
    }

    pub fn resume_workout(&self) {
        self.transition(|state| state.machine.resume(Instant::now()));
    }

    pub fn finish_workout(&self) {
        self.transition(|state| state.machine.finish(Instant::now(), Utc::now()));
    }

    pub fn add_rest_time(&self, seconds: u32) {
        self.transition(|state| state.machine.add_rest_time(seconds));
    }

    /// Adds the configured rest extension.
    pub fn extend_rest(&self) {
        self.add_rest_time(self.shared.config.rest_extension_secs);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// A receiver that sees every published snapshot; the current one is
    /// marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inspect(SessionMachine::phase)
    }

    pub fn completed_exercises(&self) -> u32 {
        self.inspect(SessionMachine::completed_exercises)
    }

    pub fn total_exercises(&self) -> u32 {
        self.inspect(SessionMachine::total_exercises)
    }

    /// The engine's own copy of the running plan, with progress marks.
    pub fn workout_plan(&self) -> Option<WorkoutPlan> {
        self.inspect(|machine| machine.plan().cloned())
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.inspect(SessionMachine::total_duration_ms)
    }

    pub fn inspect<R>(&self, f: impl FnOnce(&SessionMachine) -> R) -> R {
        f(&self.shared.lock().machine)
    }

    fn transition(&self, f: impl FnOnce(&mut EngineState)) {
        let mut state = self.shared.lock();
        let before = state.machine.phase();
        f(&mut *state);
        let after = state.machine.phase();
        if before != after {
            debug!("Session phase {} -> {}", before, after);
        }
        reconcile(&self.shared, &mut *state);
        self.shared.snapshots.send_replace(state.machine.snapshot());
    }
}

/// Starts the tickers the current phase needs and drops the ones it doesn't.
fn reconcile(shared: &Arc<Shared>, state: &mut EngineState) {
    for role in [TimerRole::Rest, TimerRole::Duration] {
        let wanted = state.wants(role);
        let running = state.timer(role).is_some();
        if wanted && !running {
            let id = shared.next_timer_id.fetch_add(1, Ordering::Relaxed);
            let weak = Arc::downgrade(shared);
            let ticker = Ticker::spawn(&shared.runtime, id, role, TICK_INTERVAL, move || {
                on_tick(&weak, role, id)
            });
            *state.timer_mut(role) = Some(ticker);
        } else if !wanted && running {
            *state.timer_mut(role) = None;
        }
    }
}

fn on_tick(shared: &Weak<Shared>, role: TimerRole, id: u64) -> bool {
    let Some(shared) = shared.upgrade() else {
        return false;
    };
    let mut state = shared.lock();
    if state.timer(role).as_ref().map(Ticker::id) != Some(id) {
        return false;
    }
    match role {
        TimerRole::Rest => {
            if !state.machine.rest_tick() {
                debug!("Rest finished");
            }
        }
        TimerRole::Duration => state.machine.duration_tick(Instant::now()),
    }
    reconcile(&shared, &mut *state);
    shared.snapshots.send_replace(state.machine.snapshot());
    state.timer(role).as_ref().map(Ticker::id) == Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, ExerciseSettings};
    use std::time::Duration;
    use tokio::time::sleep;

    fn plan(exercises: usize, sets: u32, rest: u32) -> WorkoutPlan {
        let mut plan = WorkoutPlan::new("engine plan");
        for i in 0..exercises {
            plan.add_exercise(
                Exercise::new(format!("ex-{i}"), format!("Exercise {i}"), "back"),
                ExerciseSettings {
                    sets,
                    reps: 8,
                    rest_seconds: rest,
                },
            )
            .unwrap();
        }
        plan
    }

    fn engine() -> SessionEngine {
        SessionEngine::with_current_runtime(EngineConfig::default()).unwrap()
    }

    fn timers(engine: &SessionEngine) -> (bool, bool) {
        let state = engine.shared.lock();
        (state.rest_timer.is_some(), state.duration_timer.is_some())
    }

    #[tokio::test(start_paused = true)]
    async fn rest_counts_down_and_returns_to_active() {
        let engine = engine();
        engine.start_workout(&plan(1, 3, 10));
        engine.complete_set();
        assert_eq!(engine.snapshot().phase, SessionPhase::Resting);
        assert_eq!(engine.snapshot().rest_remaining_secs, 10);

        sleep(Duration::from_millis(3_500)).await;
        assert_eq!(engine.snapshot().rest_remaining_secs, 7);

        sleep(Duration::from_secs(7)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.phase, SessionPhase::Active);
        assert_eq!(snap.rest_remaining_secs, 0);
        assert_eq!(snap.current_set, 2);
        assert_eq!(timers(&engine), (false, true));
    }

    #[tokio::test(start_paused = true)]
    async fn skip_rest_cancels_the_countdown() {
        let engine = engine();
        engine.start_workout(&plan(1, 3, 30));
        engine.complete_set();
        sleep(Duration::from_millis(2_500)).await;
        engine.skip_rest();
        assert_eq!(timers(&engine), (false, true));

        sleep(Duration::from_secs(5)).await;
        let snap = engine.snapshot();
        assert_eq!(snap.phase, SessionPhase::Active);
        assert_eq!(snap.rest_remaining_secs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_rest_and_resume_continues_it() {
        let engine = engine();
        engine.start_workout(&plan(1, 2, 10));
        engine.complete_set();
        sleep(Duration::from_millis(3_500)).await;

        engine.pause_workout();
        assert_eq!(timers(&engine), (false, false));
        let paused = engine.snapshot();
        assert_eq!(paused.phase, SessionPhase::Paused);
        assert_eq!(paused.rest_remaining_secs, 7);

        sleep(Duration::from_secs(20)).await;
        assert_eq!(engine.snapshot(), paused);

        engine.resume_workout();
        assert_eq!(engine.phase(), SessionPhase::Resting);
        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(engine.snapshot().rest_remaining_secs, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_ticks_while_running_and_finish_stamps_wall_time() {
        let engine = engine();
        engine.start_workout(&plan(2, 2, 5));
        sleep(Duration::from_millis(4_500)).await;
        assert_eq!(engine.snapshot().elapsed_ms, 4_000);

        sleep(Duration::from_millis(60_500)).await;
        engine.finish_workout();
        assert_eq!(engine.phase(), SessionPhase::Completed);
        assert_eq!(engine.total_duration_ms(), 65_000);
        assert_eq!(timers(&engine), (false, false));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.total_duration_ms(), 65_000);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_running_timers() {
        let engine = engine();
        let p = plan(1, 2, 10);
        engine.start_workout(&p);
        engine.complete_set();
        let old_rest = engine.shared.lock().rest_timer.as_ref().map(Ticker::id);

        engine.start_workout(&p);
        assert_eq!(timers(&engine), (false, true));
        engine.complete_set();
        let new_rest = engine.shared.lock().rest_timer.as_ref().map(Ticker::id);
        assert_ne!(old_rest, new_rest);

        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(engine.snapshot().rest_remaining_secs, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn extend_rest_adds_configured_seconds() {
        let engine = engine();
        engine.start_workout(&plan(1, 2, 10));
        engine.extend_rest();
        assert_eq!(engine.snapshot().rest_remaining_secs, 0);

        engine.complete_set();
        engine.extend_rest();
        assert_eq!(engine.snapshot().rest_remaining_secs, 25);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let engine = engine();
        let mut rx = engine.subscribe();
        assert!(!rx.has_changed().unwrap());

        engine.start_workout(&plan(1, 1, 0));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, SessionPhase::Active);

        engine.complete_set();
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.phase, SessionPhase::Completed);
        assert_eq!(snap.completed_exercises, 1);
        assert_eq!(snap.progress_label(), "1/1 exercises completed");
    }

    #[tokio::test]
    async fn operations_before_start_are_ignored() {
        let engine = engine();
        engine.complete_set();
        engine.pause_workout();
        engine.resume_workout();
        engine.finish_workout();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(engine.workout_plan(), None);
        assert_eq!(timers(&engine), (false, false));
    }

    #[tokio::test]
    async fn empty_plan_completes_without_timers() {
        let engine = engine();
        engine.start_workout(&WorkoutPlan::new("nothing"));
        assert_eq!(engine.phase(), SessionPhase::Completed);
        assert_eq!(engine.completed_exercises(), 0);
        assert_eq!(timers(&engine), (false, false));
    }
}
