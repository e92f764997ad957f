use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

use super::JobSubmissionPort;
use super::error::BatchError;
use super::types::{
    JobSubmissionRequest, QueueState, ServiceErrorBody, SubmitJobBody, SubmitJobResponse,
    SubmittedJob, UpdateJobQueueBody, UpdateJobQueueResponse,
};
use crate::config::EndpointConfig;

const SUBMIT_JOB_PATH: &str = "/v1/submitjob";
const UPDATE_JOB_QUEUE_PATH: &str = "/v1/updatejobqueue";

/// HTTP/JSON client for the compute service.
pub struct BatchClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BatchClient {
    pub fn from_config(endpoint: &EndpointConfig) -> Result<Self, BatchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(endpoint.connect_timeout_secs))
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            token: endpoint.token.clone(),
        })
    }

    /// Create a client pointing at a custom base URL with default timeouts (useful for testing).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, BatchError> {
        Self::from_config(&EndpointConfig {
            url: base_url.into(),
            ..EndpointConfig::default()
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, BatchError> {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("content-type", "application/json")
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000))
                .unwrap_or(1000);
            return Err(BatchError::Throttled {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let header_code = response
                .headers()
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(':').next().unwrap_or(v).to_string());
            let text = response.text().await.unwrap_or_default();
            let body: ServiceErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = body.message.unwrap_or_else(|| {
                if text.is_empty() {
                    "unknown error".to_string()
                } else {
                    text
                }
            });
            return Err(BatchError::Api {
                status: status.as_u16(),
                code: body
                    .error_type
                    .or(header_code)
                    .unwrap_or_else(|| "Unknown".to_string()),
                message,
            });
        }

        Ok(response)
    }
}

impl JobSubmissionPort for BatchClient {
    async fn submit_job(&self, req: &JobSubmissionRequest) -> Result<SubmittedJob, BatchError> {
        let body = SubmitJobBody::from(req);
        let response = self.post(SUBMIT_JOB_PATH, &body).await?;
        let parsed = response.json::<SubmitJobResponse>().await?;
        Ok(parsed.into())
    }

    async fn set_queue_state(&self, queue_id: &str, state: QueueState) -> Result<(), BatchError> {
        let body = UpdateJobQueueBody {
            job_queue: queue_id.to_string(),
            state,
        };
        match self.post(UPDATE_JOB_QUEUE_PATH, &body).await {
            Ok(response) => {
                let parsed = response.json::<UpdateJobQueueResponse>().await?;
                debug!(
                    queue = queue_id,
                    %state,
                    arn = parsed.job_queue_arn.as_deref().unwrap_or("-"),
                    "queue state updated"
                );
                Ok(())
            }
            Err(e) if state == QueueState::Disabled && e.is_already_disabled() => {
                debug!(queue = queue_id, %state, "queue already in requested state");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
