use std::fmt;

use serde::{Deserialize, Serialize};

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationCause {
    /// Exited on its own with an exit code.
    Normal,
    /// Terminated by a signal the orchestrator sent.
    Killed,
    /// Terminated by a signal nobody in the orchestrator asked for.
    Crashed,
}

/// Final result of a process, as reported by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitResult {
    /// Exit code; `None` when the process died by a signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    /// Terminating signal number, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    pub cause: TerminationCause,
}

impl ExitResult {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
            cause: TerminationCause::Normal,
        }
    }

    pub fn signaled(signal: i32, requested: bool) -> Self {
        Self {
            code: None,
            signal: Some(signal),
            cause: if requested {
                TerminationCause::Killed
            } else {
                TerminationCause::Crashed
            },
        }
    }

    /// Exit code 0 and no signal.
    pub fn success(&self) -> bool {
        self.cause == TerminationCause::Normal && self.code == Some(0)
    }
}

impl fmt::Display for ExitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(sig)) => write!(f, "signal {sig}"),
            (None, None) => f.write_str("unknown exit"),
        }
    }
}

/// Underlying reason the OS refused to create a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpawnCause {
    NotFound,
    PermissionDenied,
    ResourceLimit,
    Other,
}

impl SpawnCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpawnCause::NotFound => "not_found",
            SpawnCause::PermissionDenied => "permission_denied",
            SpawnCause::ResourceLimit => "resource_limit",
            SpawnCause::Other => "other",
        }
    }
}

/// Diagnostic detail recorded on a `Failed` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FailureReason {
    /// The descriptor could not be dispatched (e.g. missing working directory).
    InvalidConfiguration { message: String },
    /// The OS refused to create the process.
    #[serde(rename_all = "camelCase")]
    Spawn {
        cause: SpawnCause,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        os_code: Option<i32>,
        message: String,
    },
    /// The process exited with a non-zero code.
    NonZeroExit { code: i32 },
    /// The process was killed by a signal the orchestrator did not send.
    Signaled { signal: i32 },
    /// Waiting on or talking to the process failed after it was spawned.
    Runner { message: String },
}

impl FailureReason {
    /// Maps a finished, non-cancelled run onto a failure; `None` means the run succeeded.
    pub fn from_exit(exit: &ExitResult) -> Option<Self> {
        if exit.success() {
            return None;
        }
        Some(match (exit.code, exit.signal) {
            (Some(code), _) => FailureReason::NonZeroExit { code },
            (None, Some(signal)) => FailureReason::Signaled { signal },
            (None, None) => FailureReason::Runner {
                message: "process ended without exit code or signal".into(),
            },
        })
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidConfiguration { message } => {
                write!(f, "invalid configuration: {message}")
            }
            FailureReason::Spawn { cause, message, .. } => {
                write!(f, "spawn failed ({}): {message}", cause.as_str())
            }
            FailureReason::NonZeroExit { code } => write!(f, "non-zero exit code: {code}"),
            FailureReason::Signaled { signal } => write!(f, "killed by signal {signal}"),
            FailureReason::Runner { message } => write!(f, "runner error: {message}"),
        }
    }
}

/// Who asked for a job to be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CancelReason {
    Caller,
    Timeout,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_clean_zero_is_success() {
        assert!(ExitResult::exited(0).success());
        assert!(!ExitResult::exited(1).success());
        assert!(!ExitResult::signaled(9, true).success());
    }

    #[test]
    fn failure_from_exit() {
        assert_eq!(FailureReason::from_exit(&ExitResult::exited(0)), None);
        assert_eq!(
            FailureReason::from_exit(&ExitResult::exited(2)),
            Some(FailureReason::NonZeroExit { code: 2 })
        );
        assert_eq!(
            FailureReason::from_exit(&ExitResult::signaled(11, false)),
            Some(FailureReason::Signaled { signal: 11 })
        );
    }

    #[test]
    fn failure_is_internally_tagged() {
        let f = FailureReason::Spawn {
            cause: SpawnCause::NotFound,
            os_code: Some(2),
            message: "No such file or directory".into(),
        };
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.starts_with(r#"{"kind":"spawn","cause":"notFound","osCode":2"#));
    }
}
