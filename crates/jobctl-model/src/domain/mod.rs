mod kv;
pub use kv::KeyValue;

mod job_env;
pub use job_env::JobEnv;

mod job_id;
pub use job_id::JobId;

mod limits;
pub use limits::ProcessLimits;

mod job_descriptor;
pub use job_descriptor::{JobDescriptor, JobDescriptorBuilder};

mod job_state;
pub use job_state::JobState;

mod exit;
pub use exit::{CancelReason, ExitResult, FailureReason, SpawnCause, TerminationCause};

mod output;
pub use output::{OutputLine, OutputStream};

mod job_snapshot;
pub use job_snapshot::{JobSnapshot, JobSummary};

mod job_query;
pub use job_query::{JobPage, JobQuery};

mod event;
pub use event::{EventKind, JobEvent};

mod time_serde;

/// Timeout value in milliseconds.
///
/// Used in descriptors and configuration where an explicit time limit is required.
pub type TimeoutMs = u64;
