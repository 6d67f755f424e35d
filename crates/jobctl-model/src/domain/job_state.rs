use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Lifecycle state of a job.
///
/// ```text
/// Queued ──► Running ──► Completed | Failed | Cancelled
///    └──────────────────► Failed | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    /// Waiting for a free slot.
    Queued,
    /// The OS process has been spawned and has not been reaped yet.
    Running,
    /// Exited with code 0.
    Completed,
    /// Spawn failure, non-zero exit or unexpected death by signal.
    Failed,
    /// Removed from the queue or terminated on request.
    Cancelled,
}

impl JobState {
    /// Returns `true` if the job won't transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// Returns `true` if the job still occupies a queue position or a slot.
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Queued | JobState::Running)
    }

    /// Whether `self -> next` is an edge of the state graph.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match self {
            JobState::Queued => matches!(
                next,
                JobState::Running | JobState::Failed | JobState::Cancelled
            ),
            JobState::Running => next.is_terminal(),
            _ => false,
        }
    }

    pub fn transition(self, next: JobState) -> Result<JobState, ModelError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(JobState::Queued),
            "running" => Ok(JobState::Running),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "cancelled" | "canceled" => Ok(JobState::Cancelled),
            other => Err(format!("unknown job state: {other}")),
        }
    }
}
