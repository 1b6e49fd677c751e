use thiserror::Error as ThisError;
use uniffi::Error;

use crate::models::PlanError;

#[derive(Debug, ThisError, Error)]
#[non_exhaustive]
pub enum FitkageError {
    #[error("error: {0}")]
    Common(String),
    /// Rejected input, e.g. zero sets or an out-of-range rating.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl From<anyhow::Error> for FitkageError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<PlanError>() {
            Some(plan_error) => FitkageError::Validation(plan_error.to_string()),
            None => FitkageError::Common(format!("{:#}", e)),
        }
    }
}

impl From<PlanError> for FitkageError {
    fn from(e: PlanError) -> Self {
        FitkageError::Validation(e.to_string())
    }
}

impl From<String> for FitkageError {
    fn from(s: String) -> Self {
        FitkageError::Common(s)
    }
}

impl From<&str> for FitkageError {
    fn from(s: &str) -> Self {
        FitkageError::Common(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_errors_become_validation_errors() {
        let err: FitkageError = anyhow::Error::from(PlanError::ZeroReps).into();
        assert!(matches!(err, FitkageError::Validation(msg) if msg.contains("reps")));

        let err: FitkageError = anyhow::anyhow!("db locked").into();
        assert!(matches!(err, FitkageError::Common(msg) if msg == "db locked"));
    }
}
