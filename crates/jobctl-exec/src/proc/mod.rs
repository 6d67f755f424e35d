mod child;
mod lines;

pub use child::ChildProcess;

use std::process::Stdio;

use jobctl_core::{Process, Runner, RunnerError};
use jobctl_model::JobDescriptor;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::{error::ExecError, limits::attach_rlimits};

const DEFAULT_OUTPUT_BUFFER: usize = 1024;

/// Runs descriptors as OS child processes.
///
/// Each child gets its own process group (Unix), null stdin and piped stdout/stderr. The
/// descriptor's environment is applied on top of the inherited one.
#[derive(Debug, Clone)]
pub struct ProcRunner {
    name: &'static str,
    output_buffer: usize,
}

impl ProcRunner {
    pub fn new() -> Self {
        Self {
            name: "proc",
            output_buffer: DEFAULT_OUTPUT_BUFFER,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Lines buffered between the pipe readers and the consumer before reading pauses.
    pub fn with_output_buffer(mut self, lines: usize) -> Self {
        self.output_buffer = lines.max(1);
        self
    }

    fn command(spec: &JobDescriptor) -> Command {
        let mut cmd = Command::new(spec.command());
        cmd.args(spec.args());

        if let Some(cwd) = spec.cwd() {
            cmd.current_dir(cwd);
        }
        for (key, value) in spec.env().resolved() {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        attach_rlimits(&mut cmd, spec.limits());
        cmd
    }
}

impl Default for ProcRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for ProcRunner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn start(&self, spec: &JobDescriptor) -> Result<Box<dyn Process>, RunnerError> {
        if let Some(cwd) = spec.cwd()
            && !cwd.is_dir()
        {
            return Err(ExecError::MissingCwd(cwd.to_path_buf()).into());
        }

        trace!(
            target: "jobctl.exec.proc",
            descriptor = spec.id(),
            program = spec.command(),
            args = ?spec.args(),
            "spawn"
        );
        let child = Self::command(spec).spawn().map_err(ExecError::Spawn)?;
        let process = ChildProcess::new(child, self.output_buffer);
        debug!(target: "jobctl.exec.proc", descriptor = spec.id(), pid = ?process.pid(), "spawned");

        Ok(Box::new(process))
    }
}
