use std::time::Duration;

use jobctl_core::MetricsBackend;
use jobctl_model::JobState;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder, proto::MetricFamily,
};

const DURATION_BUCKETS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0,
];

/// Orchestrator metrics registered in a Prometheus registry.
///
/// Cloning is cheap; clones share the same collectors.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    submitted: IntCounter,
    started: IntCounterVec,
    finished: IntCounterVec,
    duration: HistogramVec,
    spawn_errors: IntCounterVec,
    queued: IntGauge,
    running: IntGauge,
}

impl PrometheusMetrics {
    /// Register the collectors in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register the collectors in an existing registry.
    ///
    /// Fails with `AlreadyReg` if another backend was registered there before.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let submitted = IntCounter::new(
            "jobctl_jobs_submitted_total",
            "Total number of jobs accepted by the orchestrator",
        )?;
        let started = IntCounterVec::new(
            Opts::new(
                "jobctl_jobs_started_total",
                "Total number of job processes spawned",
            ),
            &["runner"],
        )?;
        let finished = IntCounterVec::new(
            Opts::new(
                "jobctl_jobs_finished_total",
                "Total number of jobs that reached a terminal state",
            ),
            &["runner", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "jobctl_job_duration_seconds",
                "Wall time from process start to terminal state",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["runner"],
        )?;
        let spawn_errors = IntCounterVec::new(
            Opts::new(
                "jobctl_spawn_errors_total",
                "Total number of failed process spawns",
            ),
            &["runner", "cause"],
        )?;
        let queued = IntGauge::new("jobctl_jobs_queued", "Jobs waiting for a free slot")?;
        let running = IntGauge::new("jobctl_jobs_running", "Jobs holding a slot")?;

        registry.register(Box::new(submitted.clone()))?;
        registry.register(Box::new(started.clone()))?;
        registry.register(Box::new(finished.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(spawn_errors.clone()))?;
        registry.register(Box::new(queued.clone()))?;
        registry.register(Box::new(running.clone()))?;

        Ok(Self {
            registry,
            submitted,
            started,
            finished,
            duration,
            spawn_errors,
            queued,
            running,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every collector in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Content type to answer a scrape with.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn job_submitted(&self) {
        self.submitted.inc();
    }

    fn job_started(&self, runner: &str) {
        self.started.with_label_values(&[runner]).inc();
    }

    fn job_finished(&self, runner: &str, state: JobState, elapsed: Duration) {
        self.finished
            .with_label_values(&[runner, state.as_str()])
            .inc();
        self.duration
            .with_label_values(&[runner])
            .observe(elapsed.as_secs_f64());
    }

    fn spawn_failed(&self, runner: &str, cause: &str) {
        self.spawn_errors.with_label_values(&[runner, cause]).inc();
    }

    fn occupancy(&self, queued: usize, running: usize) {
        self.queued.set(i64::try_from(queued).unwrap_or(i64::MAX));
        self.running.set(i64::try_from(running).unwrap_or(i64::MAX));
    }
}
