//! Job orchestration.
//!
//! [`Orchestrator`] is a cheap, cloneable client. All state lives in a single actor task that
//! owns the registry, the pending queue and the event bus; every operation is a command sent to
//! that task with a oneshot reply, so state mutations are serialized without locks.
//!
//! ```text
//! Orchestrator ──Command──► actor ──start──► Runner
//!                            ▲  │
//!                     RunMsg │  └──publish──► Bus ──► Subscription / Subscribe
//!                            │
//!                       run task (one per running job)
//! ```

mod actor;
mod follow;
mod run;


pub use follow::OutputFollow;

use std::sync::Arc;

use jobctl_model::{JobDescriptor, JobId, JobPage, JobQuery, JobSnapshot, JobSummary};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::{
    bus::Subscription,
    config::OrchestratorConfig,
    error::CoreError,
    metrics::{self, MetricsHandle},
    runner::Runner,
    subscribe::Subscribe,
};

const COMMAND_QUEUE: usize = 256;

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// The job was still queued and has been removed; no process was spawned.
    Dequeued,
    /// Termination was requested; the job becomes `Cancelled` once the process is gone.
    Terminating,
    /// A cancellation was already in flight.
    AlreadyRequested,
    /// The job had already finished. Nothing changed.
    AlreadyTerminal,
}

impl Cancellation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cancellation::Dequeued => "dequeued",
            Cancellation::Terminating => "terminating",
            Cancellation::AlreadyRequested => "alreadyRequested",
            Cancellation::AlreadyTerminal => "alreadyTerminal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorStats {
    pub queued: usize,
    pub running: usize,
    /// Terminal handles still kept for snapshots.
    pub retained: usize,
    pub max_concurrency: usize,
}

pub(crate) enum Command {
    Submit {
        descriptor: Arc<JobDescriptor>,
        reply: oneshot::Sender<Result<JobId, CoreError>>,
    },
    Cancel {
        id: JobId,
        graceful: bool,
        reply: oneshot::Sender<Result<Cancellation, CoreError>>,
    },
    Snapshot {
        id: JobId,
        reply: oneshot::Sender<Result<JobSnapshot, CoreError>>,
    },
    List {
        query: JobQuery,
        reply: oneshot::Sender<JobPage<JobSummary>>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    /// Replied to with the final snapshot when the job becomes terminal.
    Wait {
        id: JobId,
        reply: oneshot::Sender<Result<JobSnapshot, CoreError>>,
    },
    Follow {
        id: JobId,
        reply: oneshot::Sender<Result<OutputFollow, CoreError>>,
    },
    Acknowledge {
        id: JobId,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    SetMaxConcurrency {
        n: usize,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    Stats {
        reply: oneshot::Sender<OrchestratorStats>,
    },
    Shutdown {
        graceful: bool,
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    tx: mpsc::Sender<Command>,
}

impl Orchestrator {
    pub fn builder(config: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            runner: None,
            metrics: metrics::noop(),
            subscribers: Vec::new(),
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| CoreError::Closed)?;
        rx.await.map_err(|_| CoreError::Closed)
    }

    /// Validate and enqueue a run of `descriptor`.
    ///
    /// Returns the id of the new run. The job is dispatched immediately if a slot is free.
    #[instrument(level = "debug", skip(self, descriptor), fields(descriptor = %descriptor.id()))]
    pub async fn submit(&self, descriptor: JobDescriptor) -> Result<JobId, CoreError> {
        descriptor.validate()?;
        let descriptor = Arc::new(descriptor);
        let id = self
            .request(|reply| Command::Submit { descriptor, reply })
            .await??;
        debug!(job = %id, "submitted");
        Ok(id)
    }

    /// Request cancellation.
    ///
    /// `graceful` selects SIGTERM with a grace period over an immediate kill for running jobs.
    pub async fn cancel(&self, id: &JobId, graceful: bool) -> Result<Cancellation, CoreError> {
        let id = id.clone();
        self.request(|reply| Command::Cancel {
            id,
            graceful,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self, id: &JobId) -> Result<JobSnapshot, CoreError> {
        let id = id.clone();
        self.request(|reply| Command::Snapshot { id, reply }).await?
    }

    pub async fn list(&self, query: JobQuery) -> Result<JobPage<JobSummary>, CoreError> {
        self.request(|reply| Command::List { query, reply }).await
    }

    /// Live event stream starting after this call; nothing earlier is replayed.
    pub async fn subscribe(&self) -> Result<Subscription, CoreError> {
        self.request(|reply| Command::Subscribe { reply }).await
    }

    /// Output captured so far followed by live lines until the job is terminal.
    ///
    /// Every call starts again from the first retained line.
    pub async fn follow(&self, id: &JobId) -> Result<OutputFollow, CoreError> {
        let id = id.clone();
        self.request(|reply| Command::Follow { id, reply }).await?
    }

    /// Suspend until the job is terminal and return its final snapshot.
    ///
    /// The snapshot is taken when the job finishes, so it is returned even if retention
    /// evicts the job right after.
    pub async fn wait(&self, id: &JobId) -> Result<JobSnapshot, CoreError> {
        let id = id.clone();
        self.request(|reply| Command::Wait { id, reply }).await?
    }

    /// Evict a terminal job from the registry.
    pub async fn acknowledge(&self, id: &JobId) -> Result<(), CoreError> {
        let id = id.clone();
        self.request(|reply| Command::Acknowledge { id, reply })
            .await?
    }

    /// Change the concurrency ceiling.
    ///
    /// Raising it dispatches queued jobs right away; lowering it never preempts running jobs.
    pub async fn set_max_concurrency(&self, n: usize) -> Result<(), CoreError> {
        self.request(|reply| Command::SetMaxConcurrency { n, reply })
            .await?
    }

    pub async fn stats(&self) -> Result<OrchestratorStats, CoreError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Cancel every queued and running job, wait until no process is left, then stop.
    ///
    /// Calling it on a stopped orchestrator is a no-op.
    pub async fn shutdown(&self, graceful: bool) -> Result<(), CoreError> {
        match self
            .request(|reply| Command::Shutdown { graceful, reply })
            .await
        {
            Ok(()) | Err(CoreError::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    runner: Option<Arc<dyn Runner>>,
    metrics: MetricsHandle,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OrchestratorBuilder {
    pub fn with_runner(mut self, runner: Arc<dyn Runner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Spawn the actor. Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Orchestrator, CoreError> {
        self.config.validate()?;
        let runner = self
            .runner
            .ok_or_else(|| CoreError::InvalidConfiguration("no runner configured".into()))?;

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        actor::spawn(self.config, runner, self.metrics, self.subscribers, rx);
        Ok(Orchestrator { tx })
    }
}
