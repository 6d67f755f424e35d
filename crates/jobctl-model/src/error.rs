use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("descriptor id is empty")]
    EmptyId,
    #[error("command is empty")]
    EmptyCommand,
    #[error("{field} contains a NUL byte")]
    NulByte { field: &'static str },
    #[error("invalid environment key: {0:?}")]
    InvalidEnvKey(String),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        from: crate::JobState,
        to: crate::JobState,
    },
}
