use thiserror::Error;

use crate::logger::config::{ENV_LOG_FORMAT, ENV_LOG_LEVEL};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} in {ENV_LOG_FORMAT} (expected text, json or journald)")]
    InvalidFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global logger is already installed")]
    AlreadyInitialized,
    #[error("cannot install logger: {0}")]
    InitializationFailed(String),
    #[error("invalid log filter {0:?} in {ENV_LOG_LEVEL}")]
    InvalidLogLevel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_env_var() {
        let err = LoggerError::InvalidFormat("xml".into());
        assert_eq!(
            err.to_string(),
            "unknown log format \"xml\" in JOBCTL_LOG_FORMAT (expected text, json or journald)"
        );
        assert!(
            LoggerError::InvalidLogLevel("loud".into())
                .to_string()
                .contains("JOBCTL_LOG_LEVEL")
        );
    }
}
