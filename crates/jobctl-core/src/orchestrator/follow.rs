use std::collections::VecDeque;

use jobctl_model::{EventKind, JobId, OutputLine};

use crate::bus::Subscription;

/// Lazy sequence of a job's output lines.
///
/// Yields the lines captured when it was created, then live lines as the job produces them, and
/// ends when the job reaches a terminal state. The backlog and the live stream are taken in the
/// same coordination step, so no line is skipped or repeated between them.
pub struct OutputFollow {
    job: JobId,
    backlog: VecDeque<OutputLine>,
    live: Option<Subscription>,
}

impl OutputFollow {
    pub(crate) fn new(job: JobId, backlog: Vec<OutputLine>, live: Option<Subscription>) -> Self {
        Self {
            job,
            backlog: backlog.into(),
            live,
        }
    }

    pub fn job(&self) -> &JobId {
        &self.job
    }

    pub async fn next(&mut self) -> Option<OutputLine> {
        if let Some(line) = self.backlog.pop_front() {
            return Some(line);
        }

        let live = self.live.as_mut()?;
        while let Some(event) = live.recv().await {
            if event.job != self.job {
                continue;
            }
            match event.kind {
                EventKind::OutputAppended { stream, line } => {
                    return Some(OutputLine { stream, text: line });
                }
                EventKind::Terminated { .. } => break,
                _ => {}
            }
        }
        self.live = None;
        None
    }

    /// Drain the remaining lines.
    pub async fn collect(mut self) -> Vec<OutputLine> {
        let mut lines = Vec::new();
        while let Some(line) = self.next().await {
            lines.push(line);
        }
        lines
    }
}
