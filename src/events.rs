//! Inbound event shapes.
//!
//! Each handler invocation receives one raw JSON payload from the event bus.
//! This module turns those payloads into [`ArrivalEvent`], [`BudgetAlertEvent`]
//! and [`JobStateChangeEvent`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::AdmissionError;

/// One object created in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalEvent {
    pub bucket: String,
    pub key: String,
}

impl ArrivalEvent {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Decode a storage notification.
    ///
    /// Accepts the `{"Records":[{"s3":{...}}]}` envelope, using its first
    /// record, or a bare `{"bucket":..,"key":..}` object. The key is kept
    /// exactly as delivered.
    pub fn from_value(payload: &Value) -> Result<Self, AdmissionError> {
        if let Some(records) = payload.get("Records") {
            let record = records
                .as_array()
                .and_then(|r| r.first())
                .ok_or_else(|| AdmissionError::InvalidEvent("notification has no records".into()))?;
            let bucket = string_at(record, &["s3", "bucket", "name"])
                .ok_or_else(|| AdmissionError::InvalidEvent("record has no s3.bucket.name".into()))?;
            let key = string_at(record, &["s3", "object", "key"])
                .ok_or_else(|| AdmissionError::InvalidEvent("record has no s3.object.key".into()))?;
            return Ok(Self::new(bucket, key));
        }

        serde_json::from_value::<ArrivalEvent>(payload.clone())
            .map_err(|e| AdmissionError::InvalidEvent(format!("arrival has no bucket/key: {e}")))
    }
}

/// Spend for a queue has crossed its budget threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAlertEvent {
    pub queue_id: String,
}

impl BudgetAlertEvent {
    /// Decode a budget alert for `configured_queue`.
    ///
    /// The alert always applies to the configured queue. A JSON message body
    /// (or a bare payload) naming a different `jobQueue` or `queue_id` is
    /// logged and ignored.
    pub fn from_value(payload: &Value, configured_queue: &str) -> Self {
        let named = match payload.get("Records") {
            Some(records) => records
                .as_array()
                .and_then(|r| r.first())
                .and_then(|record| string_at(record, &["Sns", "Message"]))
                .and_then(|message| serde_json::from_str::<Value>(&message).ok())
                .and_then(|message| queue_named_in(&message)),
            None => queue_named_in(payload),
        };

        if let Some(named) = named.filter(|q| q != configured_queue) {
            warn!(
                named = %named,
                configured = configured_queue,
                "budget alert names another queue, ignoring it"
            );
        }

        Self {
            queue_id: configured_queue.to_string(),
        }
    }
}

fn queue_named_in(value: &Value) -> Option<String> {
    ["jobQueue", "queue_id"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, field| v.get(*field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Terminal status of a job, as reported by the compute service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

const JOB_EVENT_SOURCE: &str = "aws.batch";
const JOB_EVENT_DETAIL_TYPE: &str = "Batch Job State Change";

/// A job reached a terminal state. Routed to the notification topic; the
/// admission handlers never act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStateChangeEvent {
    pub job_id: String,
    pub job_name: Option<String>,
    pub status: JobStatus,
    pub status_reason: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStateDetail {
    job_id: String,
    #[serde(default)]
    job_name: Option<String>,
    status: String,
    #[serde(default)]
    status_reason: Option<String>,
}

impl JobStateChangeEvent {
    /// `true` for the events forwarded to the notification topic:
    /// job-state changes from the compute service that ended in SUCCEEDED or FAILED.
    pub fn matches_notification_rule(payload: &Value) -> bool {
        payload.get("source").and_then(Value::as_str) == Some(JOB_EVENT_SOURCE)
            && payload.get("detail-type").and_then(Value::as_str) == Some(JOB_EVENT_DETAIL_TYPE)
            && matches!(
                string_at(payload, &["detail", "status"]).as_deref(),
                Some("SUCCEEDED" | "FAILED")
            )
    }

    pub fn from_value(payload: &Value) -> Result<Self, AdmissionError> {
        if !Self::matches_notification_rule(payload) {
            return Err(AdmissionError::InvalidEvent(
                "not a terminal job state change".into(),
            ));
        }
        let detail: JobStateDetail = serde_json::from_value(payload["detail"].clone())?;
        let status = match detail.status.as_str() {
            "SUCCEEDED" => JobStatus::Succeeded,
            _ => JobStatus::Failed,
        };
        let time = payload
            .get("time")
            .and_then(Value::as_str)
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(Self {
            job_id: detail.job_id,
            job_name: detail.job_name,
            status,
            status_reason: detail.status_reason,
            time,
        })
    }

    /// One-line notification text.
    pub fn summary(&self) -> String {
        let name = self.job_name.as_deref().unwrap_or("-");
        let mut line = format!("job {} ({name}) {}", self.job_id, self.status);
        if let Some(reason) = &self.status_reason {
            line.push_str(&format!(": {reason}"));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s3_notification(bucket: &str, key: &str) -> Value {
        json!({
            "Records": [{
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": bucket },
                    "object": { "key": key, "size": 1024 }
                }
            }]
        })
    }

    #[test]
    fn arrival_from_storage_notification() {
        let event = ArrivalEvent::from_value(&s3_notification("in-bucket", "a b/c.txt")).unwrap();
        assert_eq!(event, ArrivalEvent::new("in-bucket", "a b/c.txt"));
    }

    #[test]
    fn arrival_key_is_not_decoded() {
        let event = ArrivalEvent::from_value(&s3_notification("b", "a+b%2Fc.txt")).unwrap();
        assert_eq!(event.key, "a+b%2Fc.txt");
    }

    #[test]
    fn arrival_from_bare_object() {
        let event = ArrivalEvent::from_value(&json!({"bucket": "b", "key": "k"})).unwrap();
        assert_eq!(event, ArrivalEvent::new("b", "k"));
    }

    #[test]
    fn arrival_rejects_empty_records() {
        let err = ArrivalEvent::from_value(&json!({"Records": []})).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidEvent(_)));
    }

    #[test]
    fn arrival_rejects_bare_object_without_key() {
        for payload in [json!({"bucket": "b"}), json!({"key": "k"}), json!({})] {
            assert!(matches!(
                ArrivalEvent::from_value(&payload),
                Err(AdmissionError::InvalidEvent(_))
            ));
        }
    }

    #[test]
    fn arrival_rejects_record_without_key() {
        let payload = json!({"Records": [{"s3": {"bucket": {"name": "b"}, "object": {}}}]});
        assert!(matches!(
            ArrivalEvent::from_value(&payload),
            Err(AdmissionError::InvalidEvent(_))
        ));
    }

    #[test]
    fn budget_alert_defaults_to_configured_queue() {
        let payload = json!({
            "Records": [{
                "EventSource": "aws:sns",
                "Sns": {
                    "Subject": "AWS Budgets: StackBudget has exceeded your alert threshold",
                    "Message": "AWS Budget Notification: actual cost is greater than 95%"
                }
            }]
        });
        let alert = BudgetAlertEvent::from_value(&payload, "q1");
        assert_eq!(alert.queue_id, "q1");
    }

    #[test]
    fn budget_alert_ignores_other_queue_named_in_message() {
        let payload = json!({
            "Records": [{ "Sns": { "Message": "{\"jobQueue\":\"q2\"}" } }]
        });
        assert_eq!(BudgetAlertEvent::from_value(&payload, "q1").queue_id, "q1");

        let bare = json!({"queue_id": "q3"});
        assert_eq!(BudgetAlertEvent::from_value(&bare, "q1").queue_id, "q1");

        let same = json!({"jobQueue": "q1"});
        assert_eq!(BudgetAlertEvent::from_value(&same, "q1").queue_id, "q1");
    }

    fn job_event(status: &str) -> Value {
        json!({
            "source": "aws.batch",
            "detail-type": "Batch Job State Change",
            "time": "2024-01-31T12:00:00Z",
            "detail": {
                "jobId": "j-1",
                "jobName": "reports_2024_jan_csv",
                "status": status,
                "statusReason": "Essential container in task exited"
            }
        })
    }

    #[test]
    fn job_state_change_for_terminal_statuses() {
        let event = JobStateChangeEvent::from_value(&job_event("FAILED")).unwrap();
        assert_eq!(event.status, JobStatus::Failed);
        assert_eq!(event.job_id, "j-1");
        assert_eq!(
            event.time.unwrap().to_rfc3339(),
            "2024-01-31T12:00:00+00:00"
        );
        assert_eq!(
            event.summary(),
            "job j-1 (reports_2024_jan_csv) FAILED: Essential container in task exited"
        );

        let ok = JobStateChangeEvent::from_value(&job_event("SUCCEEDED")).unwrap();
        assert_eq!(ok.status, JobStatus::Succeeded);
    }

    #[test]
    fn notification_rule_ignores_non_terminal_states() {
        assert!(JobStateChangeEvent::matches_notification_rule(&job_event("SUCCEEDED")));
        assert!(!JobStateChangeEvent::matches_notification_rule(&job_event("RUNNABLE")));
        assert!(JobStateChangeEvent::from_value(&job_event("RUNNING")).is_err());

        let mut other_source = job_event("FAILED");
        other_source["source"] = json!("aws.ecs");
        assert!(!JobStateChangeEvent::matches_notification_rule(&other_source));
    }
}
