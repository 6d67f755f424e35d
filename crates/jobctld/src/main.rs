mod config;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use jobctl_api::{ApiError, HttpApi, OrchestratorAdapter};
use jobctl_core::{Orchestrator, OrchestratorConfig, Subscribe};
use jobctl_exec::ProcRunner;
use jobctl_model::jobfile;
use jobctl_observe::{Journal, LoggerConfig, logger_init};
use jobctl_prometheus::PrometheusMetrics;
use tracing::{error, info, warn};

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    let log_cfg = LoggerConfig::from_env()?;
    logger_init(&log_cfg)?;

    // 2) Configuration
    let daemon = DaemonConfig::from_env()?;
    let config = OrchestratorConfig::from_env()?;
    info!(
        max_concurrency = config.max_concurrency,
        grace_ms = config.grace_period.as_millis() as u64,
        max_retained = config.max_retained,
        "orchestrator configured"
    );

    // 3) Orchestrator
    let metrics = PrometheusMetrics::new()?;
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Journal::new())];
    let orchestrator = Orchestrator::builder(config)
        .with_runner(Arc::new(ProcRunner::new()))
        .with_metrics(Arc::new(metrics.clone()))
        .with_subscribers(subscribers)
        .build()?;
    info!("orchestrator ready");

    // 4) Startup jobs
    if let Some(path) = daemon.job_file.as_deref() {
        submit_job_file(&orchestrator, path).await?;
    }

    // 5) HTTP
    let api = HttpApi::new(Arc::new(OrchestratorAdapter::new(orchestrator.clone()))).router();
    let app = api.merge(
        Router::new()
            .route("/metrics", get(serve_metrics))
            .with_state(metrics),
    );

    let listener = tokio::net::TcpListener::bind(daemon.http_addr)
        .await
        .with_context(|| format!("bind {}", daemon.http_addr))?;
    info!(addr = %daemon.http_addr, "http api listening; press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6) Drain
    info!("shutting down: cancelling active jobs");
    orchestrator.shutdown(true).await?;
    info!("all jobs stopped");
    Ok(())
}

async fn submit_job_file(orchestrator: &Orchestrator, path: &Path) -> anyhow::Result<()> {
    let file =
        jobfile::load(path).with_context(|| format!("read job file {}", path.display()))?;

    for rejected in &file.rejected {
        warn!(
            file = %path.display(),
            line = rejected.line,
            reason = %rejected.reason,
            "job file line rejected"
        );
    }

    let mut submitted = 0usize;
    for descriptor in file.descriptors {
        let descriptor_id = descriptor.id().to_string();
        match orchestrator.submit(descriptor).await {
            Ok(job) => {
                submitted += 1;
                info!(descriptor = %descriptor_id, %job, "startup job submitted");
            }
            Err(e) => warn!(descriptor = %descriptor_id, error = %e, "startup job refused"),
        }
    }
    info!(
        file = %path.display(),
        submitted,
        rejected = file.rejected.len(),
        "job file processed"
    );
    Ok(())
}

/// GET /metrics
async fn serve_metrics(State(metrics): State<PrometheusMetrics>) -> Result<Response, ApiError> {
    let body = metrics
        .encode()
        .map_err(|e| ApiError::Internal(format!("encode metrics: {e}")))?;
    Ok(([(header::CONTENT_TYPE, metrics.content_type())], body).into_response())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
