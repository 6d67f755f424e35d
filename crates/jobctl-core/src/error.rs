use jobctl_model::{JobId, ModelError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job is still active: {0}")]
    StillActive(JobId),

    #[error("orchestrator is shutting down")]
    ShuttingDown,

    #[error("orchestrator is closed")]
    Closed,
}

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        CoreError::InvalidConfiguration(e.to_string())
    }
}
