use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::time_serde;
use crate::{ExitResult, FailureReason, JobId, JobState, OutputStream};

/// Lifecycle notification published by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub job: JobId,
    /// Position of this event in the job's own event sequence, starting at 1.
    pub seq: u64,
    #[serde(with = "time_serde")]
    pub at: SystemTime,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum EventKind {
    /// The job was accepted and placed in the pending queue.
    #[serde(rename_all = "camelCase")]
    Queued { descriptor_id: String },
    /// The OS process was spawned.
    Started {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
    },
    OutputAppended { stream: OutputStream, line: String },
    StateChanged { state: JobState },
    /// Last event of every job.
    Terminated {
        state: JobState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit: Option<ExitResult>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure: Option<FailureReason>,
    },
}

impl EventKind {
    /// Short symbolic name, for logging and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Queued { .. } => "queued",
            EventKind::Started { .. } => "started",
            EventKind::OutputAppended { .. } => "output_appended",
            EventKind::StateChanged { .. } => "state_changed",
            EventKind::Terminated { .. } => "terminated",
        }
    }
}

impl JobEvent {
    pub fn is_terminated(&self) -> bool {
        matches!(self.kind, EventKind::Terminated { .. })
    }
}
