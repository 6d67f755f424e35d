//! Seam between the orchestrator and whatever actually runs a job.
//!
//! A [`Runner`] turns a descriptor into a started [`Process`]. The orchestrator calls
//! [`Runner::start`] from its coordination context, so it must not block: spawn and return.
//! Everything after that (output, waiting, termination) happens on the job's own task.

use std::time::Duration;

use async_trait::async_trait;
use jobctl_model::{ExitResult, FailureReason, JobDescriptor, OutputLine, SpawnCause};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The descriptor cannot be run as-is (e.g. missing working directory). Nothing was spawned.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("spawn failed ({}): {message}", cause.as_str())]
    Spawn {
        cause: SpawnCause,
        os_code: Option<i32>,
        message: String,
    },

    #[error("io error: {0}")]
    Io(String),
}

impl From<RunnerError> for FailureReason {
    fn from(e: RunnerError) -> Self {
        match e {
            RunnerError::InvalidConfiguration(message) => {
                FailureReason::InvalidConfiguration { message }
            }
            RunnerError::Spawn {
                cause,
                os_code,
                message,
            } => FailureReason::Spawn {
                cause,
                os_code,
                message,
            },
            RunnerError::Io(message) => FailureReason::Runner { message },
        }
    }
}

/// Starts processes for descriptors.
pub trait Runner: Send + Sync + 'static {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Spawn the process described by `spec`.
    ///
    /// Fails only for problems detected before or during spawn; exit codes are never errors.
    fn start(&self, spec: &JobDescriptor) -> Result<Box<dyn Process>, RunnerError>;
}

/// One started process. Owned by exactly one job run and dropped when the run ends.
#[async_trait]
pub trait Process: Send + 'static {
    fn pid(&self) -> Option<u32>;

    /// Output lines of both streams. Yields `Some` once; the sequence cannot be restarted.
    fn take_output(&mut self) -> Option<OutputLines>;

    /// Suspend until the process exits on its own or is killed.
    async fn wait(&mut self) -> Result<ExitResult, RunnerError>;

    /// Stop the process and reap it.
    ///
    /// Graceful termination signals first and escalates to a kill after `grace`.
    /// Calling this on a process that already exited returns the recorded result.
    async fn terminate(&mut self, graceful: bool, grace: Duration)
    -> Result<ExitResult, RunnerError>;
}

/// Producer side of [`OutputLines`]; the sequence ends once every sink is dropped.
pub type OutputSink = mpsc::Sender<OutputLine>;

/// Finite, lazily produced sequence of output lines.
pub struct OutputLines {
    rx: mpsc::Receiver<OutputLine>,
}

impl OutputLines {
    pub fn channel(capacity: usize) -> (OutputSink, OutputLines) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, OutputLines { rx })
    }

    pub async fn next(&mut self) -> Option<OutputLine> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_errors_become_failure_reasons() {
        let spawn = RunnerError::Spawn {
            cause: SpawnCause::PermissionDenied,
            os_code: Some(13),
            message: "denied".into(),
        };
        assert_eq!(
            spawn.to_string(),
            "spawn failed (permission_denied): denied"
        );
        assert!(matches!(
            FailureReason::from(spawn),
            FailureReason::Spawn {
                cause: SpawnCause::PermissionDenied,
                os_code: Some(13),
                ..
            }
        ));
        assert!(matches!(
            FailureReason::from(RunnerError::InvalidConfiguration("no cwd".into())),
            FailureReason::InvalidConfiguration { .. }
        ));
    }

    #[tokio::test]
    async fn output_ends_when_sinks_drop() {
        let (sink, mut lines) = OutputLines::channel(4);
        let second = sink.clone();
        sink.send(OutputLine::stdout("a")).await.unwrap();
        second.send(OutputLine::stderr("b")).await.unwrap();
        drop(sink);
        drop(second);

        assert_eq!(lines.next().await, Some(OutputLine::stdout("a")));
        assert_eq!(lines.next().await, Some(OutputLine::stderr("b")));
        assert_eq!(lines.next().await, None);
    }
}
