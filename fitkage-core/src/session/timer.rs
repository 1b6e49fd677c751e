use std::time::Duration;

use log::trace;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Period of both session tickers.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRole {
    Rest,
    Duration,
}

/// A periodic task owned by the engine state. Dropping it aborts the task.
///
/// `id` is unique per spawn; the tick callback compares it with the ticker
/// currently stored for its role, so a ticker that was replaced or cancelled
/// never touches state even if its task is already mid-tick.
#[derive(Debug)]
pub struct Ticker {
    id: u64,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Calls `on_tick` every `period`, starting one period from now, until it
    /// returns `false`.
    pub fn spawn<F>(runtime: &Handle, id: u64, role: TimerRole, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !on_tick() {
                    break;
                }
            }
            trace!("{:?} ticker {} stopped", role, id);
        });
        trace!("{:?} ticker {} started", role, id);
        Self { id, handle }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
