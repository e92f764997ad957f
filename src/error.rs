use thiserror::Error;

use crate::batch::BatchError;

/// Failures surfaced by the admission handlers.
///
/// Handlers add what was being processed and hand the error back to the
/// invoking layer, which owns retry, backoff and dead-lettering.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Required static configuration is missing. Fatal at start-up.
    #[error("Config error: {0}")]
    Configuration(String),

    /// The compute service rejected a job submission.
    #[error("Job submission failed for s3://{bucket}/{key}: {source}")]
    Submission {
        bucket: String,
        key: String,
        #[source]
        source: BatchError,
    },

    /// The compute service rejected a queue state change.
    #[error("Failed to update queue {queue_id}: {source}")]
    QueueUpdate {
        queue_id: String,
        #[source]
        source: BatchError,
    },

    /// An inbound payload did not have the expected shape.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AdmissionError {
    /// The compute-service error behind a submission or queue update, if any.
    pub fn batch_error(&self) -> Option<&BatchError> {
        match self {
            AdmissionError::Submission { source, .. } | AdmissionError::QueueUpdate { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn submission_error_keeps_source() {
        let err = AdmissionError::Submission {
            bucket: "in-bucket".into(),
            key: "a b/c.txt".into(),
            source: BatchError::Rejected("queue disabled".into()),
        };
        assert_eq!(
            err.to_string(),
            "Job submission failed for s3://in-bucket/a b/c.txt: rejected: queue disabled"
        );
        assert_eq!(err.source().unwrap().to_string(), "rejected: queue disabled");
        assert!(matches!(err.batch_error(), Some(BatchError::Rejected(_))));
    }

    #[test]
    fn queue_update_display() {
        let err = AdmissionError::QueueUpdate {
            queue_id: "q1".into(),
            source: BatchError::Throttled {
                retry_after_ms: 1000,
            },
        };
        assert_eq!(
            err.to_string(),
            "Failed to update queue q1: throttled, retry after 1000ms"
        );
    }

    #[test]
    fn configuration_error_has_no_batch_source() {
        let err = AdmissionError::Configuration("missing JOBQUEUE".into());
        assert_eq!(err.to_string(), "Config error: missing JOBQUEUE");
        assert!(err.batch_error().is_none());
    }
}
