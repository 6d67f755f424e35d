//! Prometheus metrics backend for the job orchestrator.
//!
//! [`PrometheusMetrics`] implements [`jobctl_core::MetricsBackend`] on top of a
//! [`prometheus::Registry`]. It does not serve `/metrics` itself; the HTTP surface (or any other
//! server) calls [`PrometheusMetrics::encode`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use jobctl_core::MetricsHandle;
//! use jobctl_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//! # let _ = handle;
//!
//! let text = metrics.encode()?;
//! assert!(text.is_empty() || text.contains("jobctl_"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `jobctl_jobs_submitted_total` - Counter
//! - `jobctl_jobs_started_total{runner}` - Counter
//! - `jobctl_jobs_finished_total{runner, outcome}` - Counter
//! - `jobctl_job_duration_seconds{runner}` - Histogram
//! - `jobctl_spawn_errors_total{runner, cause}` - Counter
//! - `jobctl_jobs_queued` - Gauge
//! - `jobctl_jobs_running` - Gauge

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
