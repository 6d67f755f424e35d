use serde::{Deserialize, Serialize};

use super::JobState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Query parameters for listing jobs with filtering and pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQuery {
    pub state: Option<JobState>,
    pub descriptor_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Result of a paginated job query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPage<T> {
    pub items: Vec<T>,
    /// Count after filtering, before pagination.
    pub total: usize,
}

impl JobQuery {
    pub fn new() -> Self {
        Self {
            state: None,
            descriptor_id: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_descriptor(mut self, id: impl Into<String>) -> Self {
        self.descriptor_id = Some(id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Effective limit; values above the cap are clamped even when set directly.
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_LIMIT)
    }
}

impl Default for JobQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(JobQuery::new().with_limit(5000).limit, MAX_LIMIT);
        let q = JobQuery {
            limit: 5000,
            ..JobQuery::new()
        };
        assert_eq!(q.effective_limit(), MAX_LIMIT);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let q: JobQuery = serde_json::from_str(r#"{"state":"running"}"#).unwrap();
        assert_eq!(q.state, Some(JobState::Running));
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
    }
}
