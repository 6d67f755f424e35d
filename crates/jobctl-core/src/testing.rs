//! Scripted in-memory runner for scheduling tests.
//!
//! The descriptor's command picks the behavior:
//! - `ok` exits 0, `fail` exits 3, `crash` dies by an unrequested SIGSEGV;
//! - `block` exits 0 once [`FakeRunner::release`] is called with the descriptor id;
//! - `sleep` runs for an hour, `stubborn` too and also sits out the grace period of a graceful
//!   termination before it is killed;
//! - `missing` fails to spawn with `NotFound`.
//!
//! Arguments of the form `out:<text>` / `err:<text>` become output lines. A descriptor whose cwd
//! does not exist fails with `InvalidConfiguration`.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use jobctl_model::{ExitResult, JobDescriptor, OutputLine, SpawnCause};
use tokio::sync::Notify;

use crate::runner::{OutputLines, Process, Runner, RunnerError};

#[derive(Default)]
struct Shared {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    spawned: Mutex<Vec<String>>,
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl Shared {
    fn gate(&self, id: &str) -> Arc<Notify> {
        let mut gates = self.gates.lock().unwrap();
        Arc::clone(gates.entry(id.to_string()).or_default())
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeRunner {
    shared: Arc<Shared>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let one `block` job with this descriptor id exit.
    pub fn release(&self, descriptor_id: &str) {
        self.shared.gate(descriptor_id).notify_one();
    }

    /// Descriptor ids in spawn order.
    pub fn spawned(&self) -> Vec<String> {
        self.shared.spawned.lock().unwrap().clone()
    }

    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Most processes alive at the same time.
    pub fn peak(&self) -> usize {
        self.shared.peak.load(Ordering::SeqCst)
    }
}

impl Runner for FakeRunner {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn start(&self, spec: &JobDescriptor) -> Result<Box<dyn Process>, RunnerError> {
        if let Some(cwd) = spec.cwd()
            && !cwd.exists()
        {
            return Err(RunnerError::InvalidConfiguration(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }
        if spec.command() == "missing" {
            return Err(RunnerError::Spawn {
                cause: SpawnCause::NotFound,
                os_code: Some(2),
                message: "No such file or directory".into(),
            });
        }

        let lines: Vec<OutputLine> = spec
            .args()
            .iter()
            .filter_map(|a| {
                a.strip_prefix("out:")
                    .map(OutputLine::stdout)
                    .or_else(|| a.strip_prefix("err:").map(OutputLine::stderr))
            })
            .collect();
        let (sink, output) = OutputLines::channel(lines.len());
        for line in lines {
            let _ = sink.try_send(line);
        }

        self.shared
            .spawned
            .lock()
            .unwrap()
            .push(spec.id().to_string());
        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.peak.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(FakeProcess {
            command: spec.command().to_string(),
            gate: self.shared.gate(spec.id()),
            output: Some(output),
            result: None,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct FakeProcess {
    command: String,
    gate: Arc<Notify>,
    output: Option<OutputLines>,
    result: Option<ExitResult>,
    shared: Arc<Shared>,
}

impl FakeProcess {
    fn finish(&mut self, result: ExitResult) -> ExitResult {
        if self.result.is_none() {
            self.result = Some(result);
            self.shared.live.fetch_sub(1, Ordering::SeqCst);
        }
        self.result.unwrap_or(result)
    }
}

#[async_trait]
impl Process for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn take_output(&mut self) -> Option<OutputLines> {
        self.output.take()
    }

    async fn wait(&mut self) -> Result<ExitResult, RunnerError> {
        if let Some(result) = self.result {
            return Ok(result);
        }
        let result = match self.command.as_str() {
            "fail" => ExitResult::exited(3),
            "crash" => ExitResult::signaled(11, false),
            "block" => {
                self.gate.notified().await;
                ExitResult::exited(0)
            }
            "sleep" | "stubborn" => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                ExitResult::exited(0)
            }
            _ => ExitResult::exited(0),
        };
        Ok(self.finish(result))
    }

    async fn terminate(
        &mut self,
        graceful: bool,
        grace: Duration,
    ) -> Result<ExitResult, RunnerError> {
        if let Some(result) = self.result {
            return Ok(result);
        }
        let stubborn = self.command == "stubborn";
        if graceful && stubborn {
            tokio::time::sleep(grace).await;
        }
        let signal = if graceful && !stubborn { 15 } else { 9 };
        Ok(self.finish(ExitResult::signaled(signal, true)))
    }
}

impl Drop for FakeProcess {
    fn drop(&mut self) {
        if self.result.is_none() {
            self.shared.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
