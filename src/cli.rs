//! Interface de linha de comando do batchgate baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (arrival,
//! budget-alert, job-state, sanitize) e flags globais
//! (--config, --dry-run, --verbose, --log-format).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// batchgate: controle de admissão de uma fila de jobs em lote.
///
/// Cada invocação processa exatamente um evento.
#[derive(Debug, Parser)]
#[command(name = "batchgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./batchgate.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Usa um serviço de computação em memória em vez do endpoint HTTP.
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Formato dos logs.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Linhas legíveis para humanos.
    Text,
    /// Um objeto JSON por linha.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submete um job para o objeto descrito em uma notificação de chegada.
    Arrival {
        /// Arquivo JSON com o evento. Lê da entrada padrão se omitido.
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Desativa a fila após um alerta de orçamento.
    BudgetAlert {
        /// Arquivo JSON com o alerta. Lê da entrada padrão se omitido.
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Registra o resumo de um evento de término de job (não altera estado).
    JobState {
        /// Arquivo JSON com o evento. Lê da entrada padrão se omitido.
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Mostra o nome de job derivado de uma chave de objeto.
    Sanitize {
        /// Chave do objeto.
        key: String,
    },
}
