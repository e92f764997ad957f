use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::batch::{EnvironmentVariable, JobSubmissionPort, JobSubmissionRequest};
use crate::config::DispatchConfig;
use crate::error::AdmissionError;
use crate::events::ArrivalEvent;

/// Longest job name the compute service accepts.
pub const MAX_JOB_NAME_LEN: usize = 127;

pub const ENV_OUTPUT_LOCATION: &str = "S3_OUTPUT_BUCKET";
pub const ENV_INPUT_BUCKET: &str = "S3_INPUT_BUCKET";
pub const ENV_INPUT_OBJECT: &str = "S3_INPUT_OBJECT";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Derive a job name from an object key.
///
/// Every maximal run of characters outside `[A-Za-z0-9_-]` becomes a single
/// `_`, then the result is cut to [`MAX_JOB_NAME_LEN`] characters.
/// Applying it twice gives the same name as applying it once.
pub fn sanitize_job_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len().min(MAX_JOB_NAME_LEN));
    let mut in_run = false;

    for c in key.chars() {
        if is_name_char(c) {
            name.push(c);
            in_run = false;
        } else if !in_run {
            name.push('_');
            in_run = true;
        }
        if name.len() >= MAX_JOB_NAME_LEN {
            break;
        }
    }

    name
}

/// Build the submission for one arrival. The input bucket and key are copied verbatim.
pub fn build_request(event: &ArrivalEvent, config: &DispatchConfig) -> JobSubmissionRequest {
    JobSubmissionRequest {
        job_name: sanitize_job_name(&event.key),
        queue_id: config.queue_id.clone(),
        job_definition_id: config.job_definition_id.clone(),
        environment: vec![
            EnvironmentVariable::new(ENV_OUTPUT_LOCATION, &config.output_location),
            EnvironmentVariable::new(ENV_INPUT_BUCKET, &event.bucket),
            EnvironmentVariable::new(ENV_INPUT_OBJECT, &event.key),
        ],
        retry_attempts: config.retry_attempts,
    }
}

/// Result reported for a dispatched arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub status: String,
    pub key: String,
    pub job_id: String,
}

/// Turns storage arrivals into job submissions.
///
/// Holds only static configuration; nothing is remembered between
/// invocations. A redelivered arrival is submitted again.
#[derive(Debug, Clone)]
pub struct ArrivalDispatcher {
    config: DispatchConfig,
}

impl ArrivalDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Submit exactly one job for `event`. No retries: a port failure is
    /// logged with the object's bucket and key and returned to the caller.
    pub async fn dispatch(
        &self,
        port: &impl JobSubmissionPort,
        event: &ArrivalEvent,
    ) -> Result<DispatchOutcome, AdmissionError> {
        let req = build_request(event, &self.config);
        info!(
            bucket = %event.bucket,
            key = %event.key,
            job_name = %req.job_name,
            queue = %req.queue_id,
            job_definition = %req.job_definition_id,
            "submitting job"
        );

        match port.submit_job(&req).await {
            Ok(job) => {
                info!(key = %event.key, job_id = %job.job_id, "job submitted");
                Ok(DispatchOutcome {
                    status: "success".to_string(),
                    key: event.key.clone(),
                    job_id: job.job_id,
                })
            }
            Err(source) => {
                error!(
                    bucket = %event.bucket,
                    key = %event.key,
                    error = %source,
                    "error submitting job"
                );
                Err(AdmissionError::Submission {
                    bucket: event.bucket.clone(),
                    key: event.key.clone(),
                    source,
                })
            }
        }
    }
}
