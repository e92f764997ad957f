//! Tipos de dados do serviço de computação em lote.
//!
//! Os tipos de domínio ([`JobSubmissionRequest`], [`SubmittedJob`],
//! [`QueueState`]) são usados pelos handlers. Os corpos de requisição e
//! resposta (`SubmitJobBody`, `UpdateJobQueueBody`, ...) seguem o formato
//! JSON em camelCase esperado pelos endpoints `/v1/submitjob` e
//! `/v1/updatejobqueue`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Estado de aceitação de uma fila de jobs.
///
/// Serializado como `"ENABLED"` / `"DISABLED"`, o formato do serviço.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    Enabled,
    Disabled,
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueState::Enabled => write!(f, "ENABLED"),
            QueueState::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// Um par (nome, valor) do ambiente do container do job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Pedido de submissão de um job, construído do zero para cada evento de chegada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSubmissionRequest {
    /// Nome do job, já saneado (no máximo 127 caracteres de `[A-Za-z0-9_-]`).
    pub job_name: String,
    pub queue_id: String,
    pub job_definition_id: String,
    /// Variáveis de ambiente, na ordem em que serão enviadas.
    pub environment: Vec<EnvironmentVariable>,
    /// Número de tentativas que sobrescreve a política da job definition.
    /// `None` mantém a política registrada.
    pub retry_attempts: Option<u32>,
}

impl JobSubmissionRequest {
    /// Valor da variável `name`, se presente no ambiente.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }
}

/// Identificação de um job aceito pelo serviço.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub job_id: String,
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_arn: Option<String>,
}

/// Corpo JSON de `POST /v1/submitjob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobBody {
    pub job_name: String,
    pub job_queue: String,
    pub job_definition: String,
    pub container_overrides: ContainerOverrides,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_strategy: Option<RetryStrategy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerOverrides {
    pub environment: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryStrategy {
    pub attempts: u32,
}

impl From<&JobSubmissionRequest> for SubmitJobBody {
    fn from(req: &JobSubmissionRequest) -> Self {
        Self {
            job_name: req.job_name.clone(),
            job_queue: req.queue_id.clone(),
            job_definition: req.job_definition_id.clone(),
            container_overrides: ContainerOverrides {
                environment: req.environment.clone(),
            },
            retry_strategy: req.retry_attempts.map(|attempts| RetryStrategy { attempts }),
        }
    }
}

/// Resposta de `POST /v1/submitjob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub job_name: String,
    #[serde(default)]
    pub job_arn: Option<String>,
}

impl From<SubmitJobResponse> for SubmittedJob {
    fn from(resp: SubmitJobResponse) -> Self {
        Self {
            job_id: resp.job_id,
            job_name: resp.job_name,
            job_arn: resp.job_arn,
        }
    }
}

/// Corpo JSON de `POST /v1/updatejobqueue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobQueueBody {
    pub job_queue: String,
    pub state: QueueState,
}

/// Resposta de `POST /v1/updatejobqueue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobQueueResponse {
    #[serde(default)]
    pub job_queue_name: Option<String>,
    #[serde(default)]
    pub job_queue_arn: Option<String>,
}

/// Corpo de erro retornado pelo serviço em respostas não-2xx.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default, rename = "__type")]
    pub error_type: Option<String>,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
}
