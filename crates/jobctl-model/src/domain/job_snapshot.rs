use std::{sync::Arc, time::SystemTime};

use serde::{Deserialize, Serialize};

use super::time_serde;
use crate::{
    CancelReason, ExitResult, FailureReason, JobDescriptor, JobId, JobState, OutputLine,
    OutputStream,
};

/// Read-only view of a job handle, taken at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: JobId,
    pub descriptor: Arc<JobDescriptor>,
    pub state: JobState,
    #[serde(with = "time_serde")]
    pub submitted_at: SystemTime,
    #[serde(with = "time_serde::option", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<SystemTime>,
    /// Set exactly once, when a terminal state is entered.
    #[serde(with = "time_serde::option", default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<SystemTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Captured lines in arrival order, both streams interleaved.
    #[serde(default)]
    pub output: Vec<OutputLine>,
    /// Lines beyond the retention cap were published but not kept.
    #[serde(default)]
    pub output_truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    /// Set once cancellation has been requested, before the job is confirmed `Cancelled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<CancelReason>,
}

impl JobSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.is_some()
    }

    /// Exit code, once the process has been reaped.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit.and_then(|e| e.code)
    }

    /// All captured lines in arrival order.
    pub fn lines(&self) -> impl Iterator<Item = &OutputLine> {
        self.output.iter()
    }

    pub fn stdout(&self) -> impl Iterator<Item = &str> {
        self.stream(OutputStream::Stdout)
    }

    pub fn stderr(&self) -> impl Iterator<Item = &str> {
        self.stream(OutputStream::Stderr)
    }

    fn stream(&self, stream: OutputStream) -> impl Iterator<Item = &str> {
        self.output
            .iter()
            .filter(move |l| l.stream == stream)
            .map(|l| l.text.as_str())
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            descriptor_id: self.descriptor.id().to_string(),
            state: self.state,
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            exit: self.exit,
            failure: self.failure.clone(),
        }
    }
}

/// Compact listing entry without captured output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub descriptor_id: String,
    pub state: JobState,
    #[serde(with = "time_serde")]
    pub submitted_at: SystemTime,
    #[serde(with = "time_serde::option", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<SystemTime>,
    #[serde(with = "time_serde::option", default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<SystemTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}
