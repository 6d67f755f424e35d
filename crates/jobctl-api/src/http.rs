use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use jobctl_model::{JobDescriptor, JobId, JobQuery, JobState, JobSummary};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build the axum router.
    ///
    /// Routes:
    /// - POST /api/v1/jobs - Submit a descriptor
    /// - GET /api/v1/jobs - List jobs (`state`, `descriptor`, `offset`, `limit`)
    /// - GET /api/v1/jobs/{id} - Job snapshot
    /// - DELETE /api/v1/jobs/{id} - Acknowledge a terminal job
    /// - POST /api/v1/jobs/{id}/cancel - Cancel (`{"graceful": bool}`, default graceful)
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/jobs", post(submit_job::<H>).get(list_jobs::<H>))
            .route(
                "/api/v1/jobs/{id}",
                get(get_job::<H>).delete(acknowledge_job::<H>),
            )
            .route("/api/v1/jobs/{id}/cancel", post(cancel_job::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SubmitJobRequest {
    descriptor: JobDescriptor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct ListJobsParams {
    state: Option<String>,
    descriptor: Option<String>,
    /// Max items per page (default 100, max 1000)
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListJobsResponse {
    items: Vec<JobSummary>,
    total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CancelJobRequest {
    graceful: bool,
}

impl Default for CancelJobRequest {
    fn default() -> Self {
        Self { graceful: true }
    }
}

#[derive(Debug, Serialize)]
struct CancelJobResponse {
    outcome: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/jobs
async fn submit_job<H>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let req: SubmitJobRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidRequest(format!("malformed submit request: {e}")))?;

    debug!(target: "jobctl.api.http", descriptor = req.descriptor.id(), "submitting job");
    let job_id = handler.submit_job(req.descriptor).await?;

    let response = SubmitJobResponse {
        job_id: job_id.to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/jobs
async fn list_jobs<H>(
    State(handler): State<Arc<H>>,
    Query(params): Query<ListJobsParams>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let mut query = JobQuery::new();

    if let Some(state) = params.state {
        let state = state.parse::<JobState>().map_err(ApiError::InvalidRequest)?;
        query = query.with_state(state);
    }
    if let Some(descriptor) = params.descriptor {
        if descriptor.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "descriptor filter cannot be empty".into(),
            ));
        }
        query = query.with_descriptor(descriptor);
    }
    if let Some(limit) = params.limit {
        query = query.with_limit(limit);
    }
    if let Some(offset) = params.offset {
        query = query.with_offset(offset);
    }

    let page = handler.list_jobs(query).await?;
    debug!(target: "jobctl.api.http", count = page.items.len(), total = page.total, "jobs listed");

    Ok(Json(ListJobsResponse {
        items: page.items,
        total: page.total,
    }))
}

/// GET /api/v1/jobs/{id}
async fn get_job<H>(
    State(handler): State<Arc<H>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let job_id = JobId::from(id);
    let snapshot = handler.get_job(&job_id).await?;
    Ok(Json(snapshot))
}

/// DELETE /api/v1/jobs/{id}
async fn acknowledge_job<H>(
    State(handler): State<Arc<H>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let job_id = JobId::from(id);
    handler.acknowledge_job(&job_id).await?;
    debug!(target: "jobctl.api.http", %job_id, "job acknowledged");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/{id}/cancel
///
/// An empty body cancels gracefully.
async fn cancel_job<H>(
    State(handler): State<Arc<H>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CancelJobRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidRequest(format!("malformed cancel request: {e}")))?
    };

    let job_id = JobId::from(id);
    let outcome = handler.cancel_job(&job_id, req.graceful).await?;
    debug!(target: "jobctl.api.http", %job_id, outcome = outcome.as_str(), "cancel requested");

    Ok(Json(CancelJobResponse {
        outcome: outcome.as_str(),
    }))
}
