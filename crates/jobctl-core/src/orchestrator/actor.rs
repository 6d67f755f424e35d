use std::{collections::HashMap, sync::Arc, time::SystemTime};

use jobctl_model::{
    CancelReason, EventKind, ExitResult, FailureReason, JobDescriptor, JobEvent, JobId,
    JobSnapshot, JobState, OutputLine,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::{
    Cancellation, Command, OrchestratorStats,
    follow::OutputFollow,
    run::{self, RunMsg},
};
use crate::{
    bus::Bus,
    config::OrchestratorConfig,
    error::CoreError,
    handle::{JobHandle, Terminate},
    metrics::MetricsHandle,
    registry::Registry,
    runner::{Runner, RunnerError},
    subscribe::{self, Subscribe},
};

pub(super) fn spawn(
    config: OrchestratorConfig,
    runner: Arc<dyn Runner>,
    metrics: MetricsHandle,
    subscribers: Vec<Arc<dyn Subscribe>>,
    commands: mpsc::Receiver<Command>,
) {
    let (run_tx, runs) = mpsc::unbounded_channel();
    let mut actor = Actor {
        config,
        runner,
        metrics,
        registry: Registry::new(),
        bus: Bus::new(),
        run_tx,
        waiters: HashMap::new(),
        stopping: None,
    };
    for sub in subscribers {
        let subscription = actor.bus.subscribe();
        subscribe::spawn_listener(sub, subscription);
    }
    tokio::spawn(actor.run(commands, runs));
}

struct Actor {
    config: OrchestratorConfig,
    runner: Arc<dyn Runner>,
    metrics: MetricsHandle,
    registry: Registry,
    bus: Bus,
    run_tx: mpsc::UnboundedSender<RunMsg>,
    /// Callers of `wait` on jobs that are not terminal yet.
    waiters: HashMap<JobId, Vec<oneshot::Sender<Result<JobSnapshot, CoreError>>>>,
    /// Set once shutdown began; holds every caller waiting for it to finish.
    stopping: Option<Vec<oneshot::Sender<()>>>,
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut runs: mpsc::UnboundedReceiver<RunMsg>,
    ) {
        info!(
            target: "jobctl.core.orchestrator",
            runner = self.runner.name(),
            max_concurrency = self.config.max_concurrency,
            "orchestrator started"
        );
        let mut commands_open = true;

        loop {
            tokio::select! {
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(cmd) => self.on_command(cmd),
                    None => {
                        // Every client is gone; nobody can observe the jobs anymore.
                        commands_open = false;
                        self.begin_shutdown(true, None);
                    }
                },
                Some(msg) = runs.recv() => self.on_run(msg),
                else => break,
            }

            if self.stopping.is_some() && self.registry.running() == 0 {
                break;
            }
        }

        for waiter in self.stopping.take().into_iter().flatten() {
            let _ = waiter.send(());
        }
        info!(target: "jobctl.core.orchestrator", "orchestrator stopped");
    }

    fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { descriptor, reply } => {
                let _ = reply.send(self.submit(descriptor));
            }
            Command::Cancel {
                id,
                graceful,
                reply,
            } => {
                let _ = reply.send(self.cancel(&id, graceful, CancelReason::Caller));
            }
            Command::Snapshot { id, reply } => {
                let res = self
                    .registry
                    .get(&id)
                    .map(JobHandle::snapshot)
                    .ok_or(CoreError::NotFound(id));
                let _ = reply.send(res);
            }
            Command::List { query, reply } => {
                let _ = reply.send(self.registry.query(&query));
            }
            Command::Subscribe { reply } => {
                let _ = reply.send(self.bus.subscribe());
            }
            Command::Wait { id, reply } => {
                let finished = match self.registry.get(&id) {
                    None => Some(Err(CoreError::NotFound(id.clone()))),
                    Some(h) if h.state().is_terminal() => Some(Ok(h.snapshot())),
                    Some(_) => None,
                };
                match finished {
                    Some(res) => {
                        let _ = reply.send(res);
                    }
                    None => self.waiters.entry(id).or_default().push(reply),
                }
            }
            Command::Follow { id, reply } => {
                let res = match self.registry.get(&id) {
                    None => Err(CoreError::NotFound(id)),
                    Some(h) => {
                        let backlog = h.output().to_vec();
                        let live = (!h.state().is_terminal()).then(|| self.bus.subscribe());
                        Ok(OutputFollow::new(id, backlog, live))
                    }
                };
                let _ = reply.send(res);
            }
            Command::Acknowledge { id, reply } => {
                let res = self.registry.acknowledge(&id);
                if res.is_ok() {
                    debug!(target: "jobctl.core.orchestrator", job = %id, "acknowledged");
                }
                let _ = reply.send(res);
            }
            Command::SetMaxConcurrency { n, reply } => {
                let res = if n == 0 {
                    Err(CoreError::InvalidConfiguration(
                        "max_concurrency must be positive".into(),
                    ))
                } else {
                    info!(
                        target: "jobctl.core.orchestrator",
                        from = self.config.max_concurrency,
                        to = n,
                        "concurrency limit changed"
                    );
                    self.config.max_concurrency = n;
                    self.pump();
                    Ok(())
                };
                let _ = reply.send(res);
            }
            Command::Stats { reply } => {
                let _ = reply.send(OrchestratorStats {
                    queued: self.registry.queued(),
                    running: self.registry.running(),
                    retained: self.registry.retained(),
                    max_concurrency: self.config.max_concurrency,
                });
            }
            Command::Shutdown { graceful, reply } => self.begin_shutdown(graceful, Some(reply)),
        }
    }

    fn on_run(&mut self, msg: RunMsg) {
        match msg {
            RunMsg::Output { id, line } => self.on_output(&id, line),
            RunMsg::Exited { id, result } => {
                self.on_exit(&id, result);
                self.pump();
            }
            RunMsg::TimedOut { id } => {
                let running = self
                    .registry
                    .get(&id)
                    .is_some_and(|h| h.state() == JobState::Running);
                if running {
                    info!(target: "jobctl.core.orchestrator", job = %id, "timeout elapsed, cancelling");
                    let _ = self.cancel(&id, true, CancelReason::Timeout);
                }
            }
        }
    }

    fn submit(&mut self, descriptor: Arc<JobDescriptor>) -> Result<JobId, CoreError> {
        if self.stopping.is_some() {
            return Err(CoreError::ShuttingDown);
        }

        let id = JobId::new(Uuid::new_v4().to_string());
        let descriptor_id = descriptor.id().to_string();
        self.registry.insert(JobHandle::new(id.clone(), descriptor));
        self.registry.enqueue(id.clone());
        self.metrics.job_submitted();
        self.emit(&id, EventKind::Queued { descriptor_id });

        self.pump();
        Ok(id)
    }

    /// Dispatch pending jobs in FIFO order while slots are free.
    fn pump(&mut self) {
        while self.registry.running() < self.config.max_concurrency {
            let Some(id) = self.registry.pop_pending() else {
                break;
            };
            self.dispatch(id);
        }
        self.metrics
            .occupancy(self.registry.queued(), self.registry.running());
    }

    fn dispatch(&mut self, id: JobId) {
        let Some(descriptor) = self.registry.get(&id).map(|h| Arc::clone(h.descriptor())) else {
            return;
        };
        let runner = self.runner.name();

        let mut process = match self.runner.start(&descriptor) {
            Ok(process) => process,
            Err(e) => {
                if let RunnerError::Spawn { cause, .. } = &e {
                    self.metrics.spawn_failed(runner, cause.as_str());
                }
                warn!(
                    target: "jobctl.core.orchestrator",
                    job = %id,
                    descriptor = descriptor.id(),
                    error = %e,
                    "job failed to start"
                );
                self.complete(&id, JobState::Failed, None, Some(e.into()));
                return;
            }
        };

        let pid = process.pid();
        let (terminate_tx, terminate_rx) = oneshot::channel();
        let Some(handle) = self.registry.get_mut(&id) else {
            return;
        };
        if let Err(e) = handle.mark_running(pid, terminate_tx) {
            warn!(target: "jobctl.core.orchestrator", job = %id, error = %e, "cannot start job");
            return;
        }
        let output = process.take_output();
        run::spawn(
            id.clone(),
            process,
            output,
            terminate_rx,
            self.config.grace_period,
            self.run_tx.clone(),
        );

        if let Some(timeout) = descriptor.timeout().or(self.config.default_timeout) {
            let timer = run::arm_timeout(id.clone(), timeout, self.run_tx.clone());
            if let Some(handle) = self.registry.get_mut(&id) {
                handle.arm_timer(timer);
            }
        }

        self.registry.mark_running(id.clone());
        self.metrics.job_started(runner);
        debug!(
            target: "jobctl.core.orchestrator",
            job = %id,
            descriptor = descriptor.id(),
            pid = ?pid,
            "job started"
        );
        self.emit(&id, EventKind::Started { pid });
        self.emit(
            &id,
            EventKind::StateChanged {
                state: JobState::Running,
            },
        );
    }

    fn on_output(&mut self, id: &JobId, line: OutputLine) {
        let cap = self.config.max_output_lines;
        let Some(handle) = self.registry.get_mut(id) else {
            return;
        };
        if handle.state() != JobState::Running {
            return;
        }
        if !handle.append_output(line.clone(), cap) {
            trace!(target: "jobctl.core.orchestrator", job = %id, "output cap reached");
        }
        self.emit(
            id,
            EventKind::OutputAppended {
                stream: line.stream,
                line: line.text,
            },
        );
    }

    fn on_exit(&mut self, id: &JobId, result: Result<ExitResult, RunnerError>) {
        let Some(handle) = self.registry.get(id) else {
            return;
        };
        if handle.state() != JobState::Running {
            return;
        }
        let cancelled = handle.cancel_reason().is_some();

        let (state, exit, failure) = match result {
            Ok(exit) if cancelled => (JobState::Cancelled, Some(exit), None),
            Ok(exit) => match FailureReason::from_exit(&exit) {
                Some(failure) => (JobState::Failed, Some(exit), Some(failure)),
                None => (JobState::Completed, Some(exit), None),
            },
            Err(e) => {
                warn!(target: "jobctl.core.orchestrator", job = %id, error = %e, "job run failed");
                (JobState::Failed, None, Some(e.into()))
            }
        };
        self.complete(id, state, exit, failure);
    }

    /// Cancel on behalf of `reason`. Only the first request on a job sets its reason.
    fn cancel(
        &mut self,
        id: &JobId,
        graceful: bool,
        reason: CancelReason,
    ) -> Result<Cancellation, CoreError> {
        let state = self
            .registry
            .get(id)
            .map(JobHandle::state)
            .ok_or_else(|| CoreError::NotFound(id.clone()))?;

        match state {
            JobState::Queued => {
                self.registry.remove_pending(id);
                if let Some(handle) = self.registry.get_mut(id) {
                    handle.request_cancel(reason);
                }
                self.complete(id, JobState::Cancelled, None, None);
                self.metrics
                    .occupancy(self.registry.queued(), self.registry.running());
                Ok(Cancellation::Dequeued)
            }
            JobState::Running => {
                let Some(handle) = self.registry.get_mut(id) else {
                    return Err(CoreError::NotFound(id.clone()));
                };
                match handle.request_cancel(reason) {
                    Some(terminate) => {
                        debug!(
                            target: "jobctl.core.orchestrator",
                            job = %id,
                            graceful,
                            reason = ?reason,
                            "terminating job"
                        );
                        // The run task may have just finished; its exit report confirms either way.
                        let _ = terminate.send(Terminate { graceful });
                        Ok(Cancellation::Terminating)
                    }
                    None => Ok(Cancellation::AlreadyRequested),
                }
            }
            _ => Ok(Cancellation::AlreadyTerminal),
        }
    }

    /// Enter a terminal state, publish it and move the handle into retention.
    fn complete(
        &mut self,
        id: &JobId,
        state: JobState,
        exit: Option<ExitResult>,
        failure: Option<FailureReason>,
    ) {
        let Some(handle) = self.registry.get_mut(id) else {
            return;
        };
        let elapsed = handle.elapsed();
        if let Err(e) = handle.finish(state, exit, failure.clone()) {
            warn!(target: "jobctl.core.orchestrator", job = %id, error = %e, "ignoring transition");
            return;
        }

        debug!(target: "jobctl.core.orchestrator", job = %id, state = %state, "job finished");
        self.emit(id, EventKind::StateChanged { state });
        self.emit(
            id,
            EventKind::Terminated {
                state,
                exit,
                failure,
            },
        );
        self.metrics
            .job_finished(self.runner.name(), state, elapsed);

        if let Some(waiters) = self.waiters.remove(id)
            && let Some(handle) = self.registry.get(id)
        {
            let snapshot = handle.snapshot();
            for waiter in waiters {
                let _ = waiter.send(Ok(snapshot.clone()));
            }
        }

        for evicted in self
            .registry
            .retire(id.clone(), self.config.max_retained)
        {
            trace!(target: "jobctl.core.orchestrator", job = %evicted, "evicted from retention");
        }
    }

    fn begin_shutdown(&mut self, graceful: bool, reply: Option<oneshot::Sender<()>>) {
        if let Some(waiters) = self.stopping.as_mut() {
            waiters.extend(reply);
            return;
        }
        info!(
            target: "jobctl.core.orchestrator",
            graceful,
            queued = self.registry.queued(),
            running = self.registry.running(),
            "shutting down"
        );
        self.stopping = Some(reply.into_iter().collect());

        for id in self.registry.pending_ids() {
            let _ = self.cancel(&id, graceful, CancelReason::Shutdown);
        }
        for id in self.registry.running_ids() {
            let _ = self.cancel(&id, graceful, CancelReason::Shutdown);
        }
    }

    fn emit(&mut self, id: &JobId, kind: EventKind) {
        let Some(handle) = self.registry.get_mut(id) else {
            return;
        };
        let event = JobEvent {
            job: id.clone(),
            seq: handle.next_seq(),
            at: SystemTime::now(),
            kind,
        };
        self.bus.publish(event);
    }
}
