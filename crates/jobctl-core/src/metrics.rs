use std::{sync::Arc, time::Duration};

use jobctl_model::JobState;

/// Sink for orchestrator metrics.
///
/// Every method has a no-op default so backends only implement what they export.
/// Calls happen on the coordination context and must not block.
pub trait MetricsBackend: Send + Sync + 'static {
    fn job_submitted(&self) {}

    fn job_started(&self, _runner: &str) {}

    /// A job reached a terminal state. `elapsed` is measured from start, or zero if it never ran.
    fn job_finished(&self, _runner: &str, _state: JobState, _elapsed: Duration) {}

    fn spawn_failed(&self, _runner: &str, _cause: &str) {}

    fn occupancy(&self, _queued: usize, _running: usize) {}
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {}

pub fn noop() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
