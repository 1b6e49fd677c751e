use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Resting,
    Paused,
    Completed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Active => "active",
            SessionPhase::Resting => "resting",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        }
    }

    /// Phases during which the elapsed-duration ticker runs.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Resting)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}
