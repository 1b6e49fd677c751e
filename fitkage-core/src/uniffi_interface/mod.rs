pub mod errors;
pub mod logging;
pub mod objects;
pub mod session;

pub use errors::FitkageError;
pub use session::{SnapshotListener, WorkoutSessionHandle};

/// Calories estimate used for summaries, exposed so UIs can show a live
/// figure from the snapshot's elapsed time.
#[uniffi::export]
pub fn estimate_calories(elapsed_ms: u64, calories_per_minute: u32) -> u32 {
    crate::session::calories_burned(elapsed_ms, calories_per_minute)
}

#[uniffi::export]
pub fn format_duration(elapsed_ms: u64) -> String {
    crate::models::format_duration_ms(elapsed_ms)
}
