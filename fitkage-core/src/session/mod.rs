//! Workout session engine and the per-user session around it.
//!
//! [`SessionMachine`] holds the pure state transitions, [`SessionEngine`]
//! drives it with rest and duration tickers and publishes snapshots, and
//! [`Session`] ties an engine to a store and a user for summaries and saves.

mod calories;
mod engine;
mod machine;
mod phase;
mod session;
mod snapshot;
mod summary;
mod timer;
mod workout;

pub use calories::calories_burned;
pub use engine::SessionEngine;
pub use machine::SessionMachine;
pub use phase::SessionPhase;
pub use session::Session;
pub use snapshot::SessionSnapshot;
pub use summary::build_summary;
pub use timer::TICK_INTERVAL;
