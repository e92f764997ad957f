//! Tipos de erro da porta de submissão de jobs.
//!
//! [`BatchError`] cobre as falhas do serviço de computação (throttling,
//! erros da API, rede) e as recusas da implementação em memória. Os
//! handlers nunca reinterpretam esses erros; apenas adicionam contexto.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com o serviço de computação em lote.
#[derive(Debug, Error)]
pub enum BatchError {
    /// O servidor retornou HTTP 429.
    /// `retry_after_ms` indica quantos milissegundos esperar antes de retentar.
    #[error("throttled, retry after {retry_after_ms}ms")]
    Throttled { retry_after_ms: u64 },

    /// Qualquer outro erro HTTP (4xx/5xx). `code` é o tipo de erro informado
    /// pelo serviço (ex.: `ClientException`), quando presente.
    #[error("compute service error (status {status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// O serviço recusou o trabalho sem passar pela API HTTP
    /// (fila desativada ou inexistente na implementação em memória).
    #[error("rejected: {0}")]
    Rejected(String),
}

impl BatchError {
    /// `true` quando o serviço recusa um DISABLE porque a fila já está DISABLED.
    ///
    /// Aceita "already DISABLED" e "already in state DISABLED" (palavras
    /// separadas por qualquer pontuação). Outras mensagens com "already",
    /// como uma atualização em andamento ou o estado DELETING, continuam erro.
    pub fn is_already_disabled(&self) -> bool {
        let BatchError::Api { status, message, .. } = self else {
            return false;
        };
        if !(400..500).contains(status) {
            return false;
        }

        let words: Vec<String> = message
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        words.iter().enumerate().any(|(i, w)| {
            if w != "already" {
                return false;
            }
            match &words[i + 1..] {
                [next, ..] if next == "disabled" => true,
                [a, b, c, ..] => a == "in" && b == "state" && c == "disabled",
                _ => false,
            }
        })
    }

    /// Erros transitórios, que a camada de entrega pode retentar.
    pub fn is_transient(&self) -> bool {
        match self {
            BatchError::Throttled { .. } | BatchError::Network(_) => true,
            BatchError::Api { status, .. } => *status >= 500,
            BatchError::Rejected(_) => false,
        }
    }
}
