use std::collections::{HashMap, HashSet, VecDeque};

use jobctl_model::{JobId, JobPage, JobQuery, JobSummary};

use crate::{error::CoreError, handle::JobHandle};

/// Job handles indexed by id, plus the scheduling queues.
///
/// Owned by the orchestrator actor; there is no interior locking.
#[derive(Default)]
pub(crate) struct Registry {
    /// Handles indexed by JobId.
    jobs: HashMap<JobId, JobHandle>,
    /// Submission order of every handle still in `jobs`.
    order: Vec<JobId>,
    /// FIFO of queued handles awaiting a slot.
    pending: VecDeque<JobId>,
    running: HashSet<JobId>,
    /// Terminal handles, oldest first.
    retired: VecDeque<JobId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: JobHandle) {
        let id = handle.id().clone();
        self.order.push(id.clone());
        self.jobs.insert(id, handle);
    }

    pub fn get(&self, id: &JobId) -> Option<&JobHandle> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &JobId) -> Option<&mut JobHandle> {
        self.jobs.get_mut(id)
    }

    pub fn enqueue(&mut self, id: JobId) {
        self.pending.push_back(id);
    }

    pub fn pop_pending(&mut self) -> Option<JobId> {
        self.pending.pop_front()
    }

    /// Take `id` out of the pending queue. Returns whether it was queued.
    pub fn remove_pending(&mut self, id: &JobId) -> bool {
        match self.pending.iter().position(|p| p == id) {
            Some(pos) => {
                self.pending.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn pending_ids(&self) -> Vec<JobId> {
        self.pending.iter().cloned().collect()
    }

    pub fn mark_running(&mut self, id: JobId) {
        self.running.insert(id);
    }

    pub fn running_ids(&self) -> Vec<JobId> {
        self.running.iter().cloned().collect()
    }

    /// Move a handle that just became terminal into the retention queue.
    ///
    /// Returns the ids evicted to stay within `max_retained`.
    pub fn retire(&mut self, id: JobId, max_retained: usize) -> Vec<JobId> {
        self.running.remove(&id);
        self.retired.push_back(id);

        let mut evicted = Vec::new();
        while self.retired.len() > max_retained {
            let Some(oldest) = self.retired.pop_front() else {
                break;
            };
            self.forget(&oldest);
            evicted.push(oldest);
        }
        evicted
    }

    /// Evict a terminal handle.
    pub fn acknowledge(&mut self, id: &JobId) -> Result<(), CoreError> {
        let handle = self
            .jobs
            .get(id)
            .ok_or_else(|| CoreError::NotFound(id.clone()))?;
        if !handle.state().is_terminal() {
            return Err(CoreError::StillActive(id.clone()));
        }
        self.retired.retain(|r| r != id);
        self.forget(id);
        Ok(())
    }

    fn forget(&mut self, id: &JobId) {
        self.jobs.remove(id);
        self.order.retain(|o| o != id);
    }

    /// Filter, then paginate, in submission order.
    /// `total` reflects the count after filtering, before pagination.
    pub fn query(&self, q: &JobQuery) -> JobPage<JobSummary> {
        let filtered: Vec<&JobHandle> = self
            .order
            .iter()
            .filter_map(|id| self.jobs.get(id))
            .filter(|h| q.state.is_none_or(|s| h.state() == s))
            .filter(|h| {
                q.descriptor_id
                    .as_deref()
                    .is_none_or(|d| h.descriptor().id() == d)
            })
            .collect();
        let total = filtered.len();

        let items = filtered
            .into_iter()
            .skip(q.offset)
            .take(q.effective_limit())
            .map(JobHandle::summary)
            .collect();

        JobPage { items, total }
    }

    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    pub fn running(&self) -> usize {
        self.running.len()
    }

    pub fn retained(&self) -> usize {
        self.retired.len()
    }
}
