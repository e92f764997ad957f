//! Porta de submissão de jobs e suas implementações.
//!
//! O trait [`JobSubmissionPort`] é tudo o que os handlers conhecem do
//! serviço de computação. [`BatchClient`] fala HTTP com o serviço real;
//! [`InMemoryBatch`] mantém filas e jobs em processo.

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::BatchClient;
pub use error::BatchError;
pub use memory::InMemoryBatch;
pub use types::{EnvironmentVariable, JobSubmissionRequest, QueueState, SubmittedJob};

/// The two operations the admission core needs from the compute service.
///
/// Implementations are injected into each handler invocation, so a test
/// double can stand in for the real service.
pub trait JobSubmissionPort {
    /// Submit one job. Returns the identifier assigned by the service.
    async fn submit_job(&self, req: &JobSubmissionRequest) -> Result<SubmittedJob, BatchError>;

    /// Set a queue's accept/reject state.
    ///
    /// Setting a queue to the state it is already in must succeed.
    async fn set_queue_state(&self, queue_id: &str, state: QueueState) -> Result<(), BatchError>;
}
