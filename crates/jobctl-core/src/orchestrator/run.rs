use std::time::Duration;

use jobctl_model::{ExitResult, JobId, OutputLine};
use tokio::{
    sync::{mpsc, oneshot},
    task::AbortHandle,
    time,
};
use tracing::{debug, warn};

use crate::{
    handle::Terminate,
    runner::{OutputLines, Process, RunnerError},
};

/// Reports from run tasks and timers back to the actor.
pub(crate) enum RunMsg {
    Output {
        id: JobId,
        line: OutputLine,
    },
    /// Last message of a run. Every output line of that run was sent before it.
    Exited {
        id: JobId,
        result: Result<ExitResult, RunnerError>,
    },
    TimedOut {
        id: JobId,
    },
}

/// Drive one started process to completion on its own task.
///
/// If the task panics the actor still receives an `Exited` report.
pub(super) fn spawn(
    id: JobId,
    process: Box<dyn Process>,
    output: Option<OutputLines>,
    terminate: oneshot::Receiver<Terminate>,
    grace: Duration,
    tx: mpsc::UnboundedSender<RunMsg>,
) {
    let task = tokio::spawn(drive(
        id.clone(),
        process,
        output,
        terminate,
        grace,
        tx.clone(),
    ));

    tokio::spawn(async move {
        if let Err(e) = task.await {
            warn!(target: "jobctl.core.run", job = %id, error = %e, "run task died");
            let _ = tx.send(RunMsg::Exited {
                id,
                result: Err(RunnerError::Io(format!("run task died: {e}"))),
            });
        }
    });
}

async fn drive(
    id: JobId,
    mut process: Box<dyn Process>,
    output: Option<OutputLines>,
    mut terminate: oneshot::Receiver<Terminate>,
    grace: Duration,
    tx: mpsc::UnboundedSender<RunMsg>,
) {
    let mut forward = output.map(|mut lines| {
        let tx = tx.clone();
        let id = id.clone();
        tokio::spawn(async move {
            while let Some(line) = lines.next().await {
                if tx
                    .send(RunMsg::Output {
                        id: id.clone(),
                        line,
                    })
                    .is_err()
                {
                    break;
                }
            }
        })
    });

    let result = tokio::select! {
        res = process.wait() => res,
        req = &mut terminate => match req {
            Ok(Terminate { graceful }) => process.terminate(graceful, grace).await,
            // No request will ever arrive.
            Err(_) => process.wait().await,
        },
    };

    // Pipes close once the process is gone, unless a grandchild inherited them.
    if let Some(forward) = forward.as_mut()
        && time::timeout(grace, &mut *forward).await.is_err()
    {
        debug!(target: "jobctl.core.run", job = %id, "output still open after exit, detaching");
        forward.abort();
    }

    drop(process);
    let _ = tx.send(RunMsg::Exited { id, result });
}

/// Schedule an automatic cancellation `after` from now.
pub(super) fn arm_timeout(
    id: JobId,
    after: Duration,
    tx: mpsc::UnboundedSender<RunMsg>,
) -> AbortHandle {
    tokio::spawn(async move {
        time::sleep(after).await;
        let _ = tx.send(RunMsg::TimedOut { id });
    })
    .abort_handle()
}
