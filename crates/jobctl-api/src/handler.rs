use async_trait::async_trait;
use jobctl_core::Cancellation;
use jobctl_model::{JobDescriptor, JobId, JobPage, JobQuery, JobSnapshot, JobSummary};

use crate::error::ApiError;

/// Job control API handler.
///
/// Abstracts the backend so callers can use [`OrchestratorAdapter`](crate::OrchestratorAdapter)
/// directly or wrap it with extra policy (auth, quotas).
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Validate and enqueue a descriptor.
    async fn submit_job(&self, descriptor: JobDescriptor) -> Result<JobId, ApiError>;

    async fn cancel_job(&self, id: &JobId, graceful: bool) -> Result<Cancellation, ApiError>;

    async fn get_job(&self, id: &JobId) -> Result<JobSnapshot, ApiError>;

    async fn list_jobs(&self, query: JobQuery) -> Result<JobPage<JobSummary>, ApiError>;

    /// Forget a terminal job.
    async fn acknowledge_job(&self, id: &JobId) -> Result<(), ApiError>;
}
