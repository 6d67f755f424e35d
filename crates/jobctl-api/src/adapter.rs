use async_trait::async_trait;
use jobctl_core::{Cancellation, Orchestrator};
use jobctl_model::{JobDescriptor, JobId, JobPage, JobQuery, JobSnapshot, JobSummary};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that delegates every call to an [`Orchestrator`].
#[derive(Clone)]
pub struct OrchestratorAdapter {
    orchestrator: Orchestrator,
}

impl OrchestratorAdapter {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl ApiHandler for OrchestratorAdapter {
    async fn submit_job(&self, descriptor: JobDescriptor) -> Result<JobId, ApiError> {
        Ok(self.orchestrator.submit(descriptor).await?)
    }

    async fn cancel_job(&self, id: &JobId, graceful: bool) -> Result<Cancellation, ApiError> {
        Ok(self.orchestrator.cancel(id, graceful).await?)
    }

    async fn get_job(&self, id: &JobId) -> Result<JobSnapshot, ApiError> {
        Ok(self.orchestrator.snapshot(id).await?)
    }

    async fn list_jobs(&self, query: JobQuery) -> Result<JobPage<JobSummary>, ApiError> {
        Ok(self.orchestrator.list(query).await?)
    }

    async fn acknowledge_job(&self, id: &JobId) -> Result<(), ApiError> {
        Ok(self.orchestrator.acknowledge(id).await?)
    }
}
