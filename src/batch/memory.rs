use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::JobSubmissionPort;
use super::error::BatchError;
use super::types::{JobSubmissionRequest, QueueState, SubmittedJob};

/// In-process compute service.
///
/// Queues must be registered before use. Submissions to a DISABLED or
/// unknown queue are rejected, the same way the real service stops
/// accepting work once a queue is disabled.
#[derive(Debug, Default)]
pub struct InMemoryBatch {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    queues: HashMap<String, QueueState>,
    submitted: Vec<(SubmittedJob, JobSubmissionRequest)>,
    state_changes: Vec<(String, QueueState)>,
}

impl InMemoryBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a single queue in the given state.
    pub fn with_queue(queue_id: impl Into<String>, state: QueueState) -> Self {
        let batch = Self::new();
        batch.register_queue(queue_id, state);
        batch
    }

    pub fn register_queue(&self, queue_id: impl Into<String>, state: QueueState) {
        self.lock().queues.insert(queue_id.into(), state);
    }

    pub fn queue_state(&self, queue_id: &str) -> Option<QueueState> {
        self.lock().queues.get(queue_id).copied()
    }

    /// Accepted submissions, in arrival order.
    pub fn submitted(&self) -> Vec<JobSubmissionRequest> {
        self.lock()
            .submitted
            .iter()
            .map(|(_, req)| req.clone())
            .collect()
    }

    /// Every `set_queue_state` call that reached the service, including no-ops.
    pub fn state_changes(&self) -> Vec<(String, QueueState)> {
        self.lock().state_changes.clone()
    }

    // A poisoned lock only means another caller panicked mid-update; the maps stay usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JobSubmissionPort for InMemoryBatch {
    async fn submit_job(&self, req: &JobSubmissionRequest) -> Result<SubmittedJob, BatchError> {
        let mut inner = self.lock();
        match inner.queues.get(&req.queue_id) {
            None => {
                return Err(BatchError::Rejected(format!(
                    "job queue {} does not exist",
                    req.queue_id
                )));
            }
            Some(QueueState::Disabled) => {
                return Err(BatchError::Rejected(format!(
                    "job queue {} is DISABLED and does not accept jobs",
                    req.queue_id
                )));
            }
            Some(QueueState::Enabled) => {}
        }

        let job = SubmittedJob {
            job_id: Uuid::new_v4().to_string(),
            job_name: req.job_name.clone(),
            job_arn: None,
        };
        inner.submitted.push((job.clone(), req.clone()));
        Ok(job)
    }

    async fn set_queue_state(&self, queue_id: &str, state: QueueState) -> Result<(), BatchError> {
        let mut inner = self.lock();
        let Some(current) = inner.queues.get_mut(queue_id) else {
            return Err(BatchError::Rejected(format!(
                "job queue {queue_id} does not exist"
            )));
        };
        *current = state;
        inner.state_changes.push((queue_id.to_string(), state));
        Ok(())
    }
}
