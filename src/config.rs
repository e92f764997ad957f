//! Configuração do batchgate carregada a partir de `batchgate.toml`.
//!
//! A struct [`AdmissionConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `OUTPUT_BUCKET`, `JOBQUEUE`, `JOBDEF`,
//! `BATCH_ENDPOINT` e `BATCH_TOKEN` têm precedência sobre o arquivo.
//!
//! A configuração é validada uma única vez na inicialização
//! ([`AdmissionConfig::dispatch_config`], [`AdmissionConfig::breaker_queue`]);
//! os handlers recebem apenas valores já validados.

use std::path::Path;

use serde::Deserialize;

use crate::error::AdmissionError;

/// Arquivo lido quando `--config` não é informado.
pub const DEFAULT_CONFIG_FILE: &str = "batchgate.toml";

/// Configuração de nível superior carregada de `batchgate.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdmissionConfig {
    /// Local de saída repassado aos jobs (`S3_OUTPUT_BUCKET`).
    #[serde(default)]
    pub output_location: Option<String>,

    /// Fila que recebe os jobs e que é desativada quando o orçamento estoura.
    #[serde(default)]
    pub queue_id: Option<String>,

    /// Job definition registrada usada em cada submissão.
    #[serde(default)]
    pub job_definition_id: Option<String>,

    /// Sobrescreve o número de tentativas da job definition, se definido.
    #[serde(default)]
    pub retry_attempts: Option<u32>,

    /// Endpoint do serviço de computação.
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

/// Parâmetros de conexão com o serviço de computação.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_url")]
    pub url: String,

    /// Token enviado como `Authorization: Bearer`.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

// Endpoint local padrão.
fn default_url() -> String {
    "http://127.0.0.1:4566".to_string()
}

// Timeout padrão de cada requisição: 30s.
fn default_timeout_secs() -> u64 {
    30
}

// Timeout padrão de conexão: 10s.
fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Configuração validada do despachante de chegadas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub output_location: String,
    pub queue_id: String,
    pub job_definition_id: String,
    pub retry_attempts: Option<u32>,
}

impl AdmissionConfig {
    /// Carrega a configuração de `path` (ou de `batchgate.toml` no diretório atual)
    /// e aplica as variáveis de ambiente do processo.
    /// Só o arquivo padrão pode estar ausente; um `path` explícito inexistente é erro.
    pub fn load(path: Option<&Path>) -> Result<Self, AdmissionError> {
        let mut config = match path {
            Some(p) => Self::read(p)?,
            None => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Lê apenas o arquivo, sem olhar o ambiente. Usa valores padrão se ele não existir.
    pub fn from_file(path: &Path) -> Result<Self, AdmissionError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::read(path)
    }

    /// Lê o arquivo, que precisa existir.
    pub fn read(path: &Path) -> Result<Self, AdmissionError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<AdmissionConfig>(&contents)?)
    }

    /// Variáveis de ambiente têm precedência sobre o arquivo. Valores vazios são ignorados.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = var("OUTPUT_BUCKET") {
            self.output_location = Some(v);
        }
        if let Some(v) = var("JOBQUEUE") {
            self.queue_id = Some(v);
        }
        if let Some(v) = var("JOBDEF") {
            self.job_definition_id = Some(v);
        }
        if let Some(v) = var("BATCH_ENDPOINT") {
            self.endpoint.url = v;
        }
        if let Some(v) = var("BATCH_TOKEN") {
            self.endpoint.token = Some(v);
        }
    }

    /// Valida os três parâmetros obrigatórios do despachante.
    /// O erro lista todos os que estiverem faltando.
    pub fn dispatch_config(&self) -> Result<DispatchConfig, AdmissionError> {
        let mut missing = Vec::new();
        let output_location = required(&self.output_location, "output_location (OUTPUT_BUCKET)", &mut missing);
        let queue_id = required(&self.queue_id, "queue_id (JOBQUEUE)", &mut missing);
        let job_definition_id = required(&self.job_definition_id, "job_definition_id (JOBDEF)", &mut missing);

        match (output_location, queue_id, job_definition_id) {
            (Some(output_location), Some(queue_id), Some(job_definition_id)) => Ok(DispatchConfig {
                output_location,
                queue_id,
                job_definition_id,
                retry_attempts: self.retry_attempts,
            }),
            _ => Err(AdmissionError::Configuration(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            ))),
        }
    }

    /// Fila configurada para o disjuntor de orçamento.
    pub fn breaker_queue(&self) -> Result<String, AdmissionError> {
        let mut missing = Vec::new();
        required(&self.queue_id, "queue_id (JOBQUEUE)", &mut missing).ok_or_else(|| {
            AdmissionError::Configuration(format!("missing required setting(s): {}", missing.join(", ")))
        })
    }
}

fn required(value: &Option<String>, label: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            missing.push(label);
            None
        }
    }
}
