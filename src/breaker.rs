use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::batch::{JobSubmissionPort, QueueState};
use crate::error::AdmissionError;
use crate::events::BudgetAlertEvent;

/// Result reported after a budget alert has been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripOutcome {
    pub status: String,
    pub queue: String,
}

/// One-way admission cut-off for a job queue.
///
/// A budget alert always disables the referenced queue. There is no path
/// back to ENABLED here; re-enabling is an administrative action.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetCircuitBreaker;

impl BudgetCircuitBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Disable the alert's queue. Safe to repeat for the same alert: the port
    /// treats disabling a DISABLED queue as success.
    pub async fn trip(
        &self,
        port: &impl JobSubmissionPort,
        alert: &BudgetAlertEvent,
    ) -> Result<TripOutcome, AdmissionError> {
        let queue = alert.queue_id.as_str();
        warn!(queue, "budget exceeded, disabling queue");

        match port.set_queue_state(queue, QueueState::Disabled).await {
            Ok(()) => {
                info!(queue, "queue disabled");
                Ok(TripOutcome {
                    status: "success".to_string(),
                    queue: queue.to_string(),
                })
            }
            Err(source) => {
                error!(queue, error = %source, "error disabling queue");
                Err(AdmissionError::QueueUpdate {
                    queue_id: queue.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchError, InMemoryBatch, JobSubmissionRequest, SubmittedJob};
    use std::sync::Mutex;

    fn alert(queue: &str) -> BudgetAlertEvent {
        BudgetAlertEvent {
            queue_id: queue.to_string(),
        }
    }

    #[tokio::test]
    async fn trip_disables_enabled_queue() {
        let batch = InMemoryBatch::with_queue("q1", QueueState::Enabled);

        let outcome = BudgetCircuitBreaker::new().trip(&batch, &alert("q1")).await.unwrap();

        assert_eq!(
            outcome,
            TripOutcome {
                status: "success".into(),
                queue: "q1".into(),
            }
        );
        assert_eq!(batch.queue_state("q1"), Some(QueueState::Disabled));
        assert_eq!(
            batch.state_changes(),
            vec![("q1".to_string(), QueueState::Disabled)]
        );
    }

    #[tokio::test]
    async fn repeated_alert_reports_same_success() {
        let batch = InMemoryBatch::with_queue("q1", QueueState::Enabled);
        let breaker = BudgetCircuitBreaker::new();

        let first = breaker.trip(&batch, &alert("q1")).await.unwrap();
        let second = breaker.trip(&batch, &alert("q1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(batch.queue_state("q1"), Some(QueueState::Disabled));
    }

    #[tokio::test]
    async fn already_disabled_queue_is_success() {
        let batch = InMemoryBatch::with_queue("q1", QueueState::Disabled);
        let outcome = BudgetCircuitBreaker::new().trip(&batch, &alert("q1")).await.unwrap();
        assert_eq!(outcome.status, "success");
        assert_eq!(batch.queue_state("q1"), Some(QueueState::Disabled));
    }

    // --- Mock port ---

    struct FailingPort {
        requested: Mutex<Vec<(String, QueueState)>>,
    }

    impl JobSubmissionPort for FailingPort {
        async fn submit_job(&self, _req: &JobSubmissionRequest) -> Result<SubmittedJob, BatchError> {
            panic!("breaker must not submit jobs");
        }

        async fn set_queue_state(&self, queue_id: &str, state: QueueState) -> Result<(), BatchError> {
            self.requested
                .lock()
                .unwrap()
                .push((queue_id.to_string(), state));
            Err(BatchError::Api {
                status: 403,
                code: "AccessDeniedException".into(),
                message: "not authorized to perform batch:UpdateJobQueue".into(),
            })
        }
    }

    #[tokio::test]
    async fn port_failure_is_queue_update_error() {
        let port = FailingPort {
            requested: Mutex::new(Vec::new()),
        };

        let err = BudgetCircuitBreaker::new()
            .trip(&port, &alert("q1"))
            .await
            .unwrap_err();

        match err {
            AdmissionError::QueueUpdate { queue_id, source } => {
                assert_eq!(queue_id, "q1");
                assert!(matches!(source, BatchError::Api { status: 403, .. }));
            }
            other => panic!("expected QueueUpdate error, got {other:?}"),
        }
        // Only DISABLED is ever requested, and only once.
        assert_eq!(
            *port.requested.lock().unwrap(),
            vec![("q1".to_string(), QueueState::Disabled)]
        );
    }
}
