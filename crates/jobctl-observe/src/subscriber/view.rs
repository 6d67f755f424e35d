use jobctl_model::{EventKind, JobEvent, JobState};
use tracing::{debug, error, info, trace, warn};

#[inline]
pub fn message_for(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Queued { .. } => "job queued",
        EventKind::Started { .. } => "job process started",
        EventKind::OutputAppended { .. } => "job output",
        EventKind::StateChanged { .. } => "job state changed",
        EventKind::Terminated { state, .. } => match state {
            JobState::Completed => "job completed",
            JobState::Failed => "job failed",
            JobState::Cancelled => "job cancelled",
            JobState::Queued | JobState::Running => "job terminated",
        },
    }
}

/// Log one orchestrator event at a level that matches its weight.
///
/// Output lines go to `trace`, failures to `error`, cancellations to `warn`.
pub fn log_event(e: &JobEvent) {
    let msg = message_for(&e.kind);
    let job = e.job.as_str();

    match &e.kind {
        EventKind::Queued { descriptor_id } => {
            debug!(target: "jobctl.observe.journal", job, descriptor = %descriptor_id, "{msg}")
        }
        EventKind::Started { pid } => {
            info!(target: "jobctl.observe.journal", job, pid = ?pid, "{msg}")
        }
        EventKind::OutputAppended { stream, line } => trace!(
            target: "jobctl.observe.journal",
            job,
            stream = stream.as_str(),
            line = %line,
            "{msg}"
        ),
        EventKind::StateChanged { state } => {
            debug!(target: "jobctl.observe.journal", job, state = state.as_str(), "{msg}")
        }
        EventKind::Terminated {
            state,
            exit,
            failure,
        } => {
            let exit = exit.map(|x| x.to_string()).unwrap_or_else(|| "none".into());
            match state {
                JobState::Completed => {
                    info!(target: "jobctl.observe.journal", job, exit = %exit, "{msg}")
                }
                JobState::Cancelled => {
                    warn!(target: "jobctl.observe.journal", job, exit = %exit, "{msg}")
                }
                _ => {
                    let reason = failure
                        .as_ref()
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "unknown".into());
                    error!(
                        target: "jobctl.observe.journal",
                        job,
                        state = state.as_str(),
                        exit = %exit,
                        reason = %reason,
                        "{msg}"
                    )
                }
            }
        }
    }
}
