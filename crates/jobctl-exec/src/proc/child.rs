use std::{process::ExitStatus, time::Duration};

use async_trait::async_trait;
use jobctl_core::{OutputLines, Process, RunnerError};
use jobctl_model::{ExitResult, OutputStream};
use tokio::{process::Child, time};
use tracing::{debug, trace};

use super::lines::forward_lines;
use crate::{error::ExecError, util::exit_result};

/// A spawned child, owned by one job run.
///
/// Dropping it kills the child if it is still running.
pub struct ChildProcess {
    child: Child,
    pid: Option<u32>,
    output: Option<OutputLines>,
    exit: Option<ExitResult>,
    /// Set once we have signalled the child, so its death is not reported as a crash.
    signalled: bool,
}

impl ChildProcess {
    /// Wrap a child spawned with piped stdout/stderr and start forwarding both streams.
    pub fn new(mut child: Child, output_buffer: usize) -> Self {
        let (sink, output) = OutputLines::channel(output_buffer);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, sink));
        }

        Self {
            pid: child.id(),
            child,
            output: Some(output),
            exit: None,
            signalled: false,
        }
    }

    fn record(&mut self, status: ExitStatus) -> ExitResult {
        let exit = exit_result(status, self.signalled);
        self.exit = Some(exit);
        trace!(target: "jobctl.exec.proc", pid = ?self.pid, %exit, "reaped");
        exit
    }

    /// Already reaped by a previous, interrupted wait.
    fn try_reaped(&mut self) -> Result<Option<ExitResult>, ExecError> {
        if let Some(exit) = self.exit {
            return Ok(Some(exit));
        }
        Ok(self
            .child
            .try_wait()
            .map_err(ExecError::Wait)?
            .map(|status| self.record(status)))
    }

    fn send(&mut self, signal: Signal) -> Result<(), ExecError> {
        self.signalled = true;

        #[cfg(unix)]
        {
            let raw = match signal {
                Signal::Term => crate::util::SIGTERM,
                Signal::Kill => crate::util::SIGKILL,
            };
            if let Some(pid) = self.pid {
                crate::util::signal_group(pid, raw).map_err(ExecError::Kill)?;
            }
        }

        // No process groups or SIGTERM here: either request ends the child outright.
        #[cfg(not(unix))]
        {
            let _ = signal;
            if let Err(e) = self.child.start_kill()
                && e.kind() != std::io::ErrorKind::InvalidInput
            {
                return Err(ExecError::Kill(e));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Term,
    Kill,
}

#[async_trait]
impl Process for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn take_output(&mut self) -> Option<OutputLines> {
        self.output.take()
    }

    async fn wait(&mut self) -> Result<ExitResult, RunnerError> {
        if let Some(exit) = self.exit {
            return Ok(exit);
        }
        let status = self.child.wait().await.map_err(ExecError::Wait)?;
        Ok(self.record(status))
    }

    async fn terminate(
        &mut self,
        graceful: bool,
        grace: Duration,
    ) -> Result<ExitResult, RunnerError> {
        if let Some(exit) = self.try_reaped()? {
            return Ok(exit);
        }

        if graceful {
            self.send(Signal::Term)?;
            match time::timeout(grace, self.child.wait()).await {
                Ok(status) => {
                    let status = status.map_err(ExecError::Wait)?;
                    return Ok(self.record(status));
                }
                Err(_) => {
                    debug!(target: "jobctl.exec.proc", pid = ?self.pid, ?grace, "grace period elapsed, killing");
                }
            }
        }

        self.send(Signal::Kill)?;
        let status = self.child.wait().await.map_err(ExecError::Wait)?;
        Ok(self.record(status))
    }
}
