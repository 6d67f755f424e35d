use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use jobctl_model::{
    CancelReason, ExitResult, FailureReason, JobDescriptor, JobId, JobSnapshot, JobState,
    JobSummary, ModelError, OutputLine,
};
use tokio::{sync::oneshot, task::AbortHandle};

/// Request delivered to a running job's task.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Terminate {
    pub graceful: bool,
}

/// Run-time record of one job. Lives inside the registry and is only touched by the actor.
pub(crate) struct JobHandle {
    id: JobId,
    descriptor: Arc<JobDescriptor>,
    state: JobState,
    submitted_at: SystemTime,
    started_at: Option<SystemTime>,
    started: Option<Instant>,
    ended_at: Option<SystemTime>,
    pid: Option<u32>,
    output: Vec<OutputLine>,
    output_truncated: bool,
    exit: Option<ExitResult>,
    failure: Option<FailureReason>,
    cancel: Option<CancelReason>,
    seq: u64,
    terminate: Option<oneshot::Sender<Terminate>>,
    timer: Option<AbortHandle>,
}

impl JobHandle {
    pub fn new(id: JobId, descriptor: Arc<JobDescriptor>) -> Self {
        Self {
            id,
            descriptor,
            state: JobState::Queued,
            submitted_at: SystemTime::now(),
            started_at: None,
            started: None,
            ended_at: None,
            pid: None,
            output: Vec::new(),
            output_truncated: false,
            exit: None,
            failure: None,
            cancel: None,
            seq: 0,
            terminate: None,
            timer: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn descriptor(&self) -> &Arc<JobDescriptor> {
        &self.descriptor
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn cancel_reason(&self) -> Option<CancelReason> {
        self.cancel
    }

    /// Sequence number for the next event of this job.
    pub fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Time spent running so far, zero if the job never started.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn mark_running(
        &mut self,
        pid: Option<u32>,
        terminate: oneshot::Sender<Terminate>,
    ) -> Result<(), ModelError> {
        self.state = self.state.transition(JobState::Running)?;
        self.started_at = Some(SystemTime::now());
        self.started = Some(Instant::now());
        self.pid = pid;
        self.terminate = Some(terminate);
        Ok(())
    }

    pub fn arm_timer(&mut self, timer: AbortHandle) {
        self.timer = Some(timer);
    }

    /// Keep `line` unless the per-job cap is reached. Returns whether it was retained.
    pub fn append_output(&mut self, line: OutputLine, cap: usize) -> bool {
        if self.output.len() >= cap {
            self.output_truncated = true;
            return false;
        }
        self.output.push(line);
        true
    }

    /// Record a cancellation request.
    ///
    /// Returns the terminate channel the first time it is called on a running job, so the caller
    /// can signal the job's task. Later calls return `None`.
    pub fn request_cancel(&mut self, reason: CancelReason) -> Option<oneshot::Sender<Terminate>> {
        if self.cancel.is_none() {
            self.cancel = Some(reason);
        }
        self.terminate.take()
    }

    /// Enter a terminal state. The end timestamp is written here and nowhere else.
    pub fn finish(
        &mut self,
        state: JobState,
        exit: Option<ExitResult>,
        failure: Option<FailureReason>,
    ) -> Result<(), ModelError> {
        debug_assert!(state.is_terminal());
        self.state = self.state.transition(state)?;
        self.ended_at = Some(SystemTime::now());
        self.exit = exit;
        self.failure = failure;
        self.terminate = None;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        Ok(())
    }

    pub fn output(&self) -> &[OutputLine] {
        &self.output
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

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            descriptor: Arc::clone(&self.descriptor),
            state: self.state,
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            pid: self.pid,
            output: self.output.clone(),
            output_truncated: self.output_truncated,
            exit: self.exit,
            failure: self.failure.clone(),
            cancel: self.cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> JobHandle {
        let d = JobDescriptor::builder("d", "true").build().unwrap();
        JobHandle::new(JobId::from("h"), Arc::new(d))
    }

    #[test]
    fn end_timestamp_is_set_once() {
        let mut h = handle();
        let (tx, _rx) = oneshot::channel();
        h.mark_running(Some(7), tx).unwrap();
        assert!(h.snapshot().ended_at.is_none());

        h.finish(JobState::Completed, Some(ExitResult::exited(0)), None)
            .unwrap();
        let ended = h.snapshot().ended_at;
        assert!(ended.is_some());

        assert!(h.finish(JobState::Failed, None, None).is_err());
        assert_eq!(h.snapshot().ended_at, ended);
        assert_eq!(h.state(), JobState::Completed);
    }

    #[test]
    fn running_cannot_be_entered_twice() {
        let mut h = handle();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        h.mark_running(None, tx1).unwrap();
        assert!(h.mark_running(None, tx2).is_err());
    }

    #[test]
    fn output_is_capped() {
        let mut h = handle();
        assert!(h.append_output(OutputLine::stdout("1"), 2));
        assert!(h.append_output(OutputLine::stdout("2"), 2));
        assert!(!h.append_output(OutputLine::stdout("3"), 2));

        let snap = h.snapshot();
        assert_eq!(snap.output.len(), 2);
        assert!(snap.output_truncated);
    }

    #[test]
    fn cancel_hands_out_the_terminate_channel_once() {
        let mut h = handle();
        let (tx, _rx) = oneshot::channel();
        h.mark_running(None, tx).unwrap();

        assert!(h.request_cancel(CancelReason::Caller).is_some());
        assert!(h.request_cancel(CancelReason::Timeout).is_none());
        assert_eq!(h.cancel_reason(), Some(CancelReason::Caller));
    }
}
