//! Admission control for a managed batch-compute queue.
//!
//! Two stateless handlers sit between the event bus and the compute service:
//! - [`dispatcher::ArrivalDispatcher`] submits one job per object arrival.
//! - [`breaker::BudgetCircuitBreaker`] disables the queue when its budget alert fires.
//!
//! Both talk to the compute service only through [`batch::JobSubmissionPort`].

pub mod batch;
pub mod breaker;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;

pub use batch::{BatchClient, BatchError, InMemoryBatch, JobSubmissionPort, QueueState};
pub use breaker::{BudgetCircuitBreaker, TripOutcome};
pub use config::{AdmissionConfig, DispatchConfig};
pub use dispatcher::{ArrivalDispatcher, DispatchOutcome, sanitize_job_name};
pub use error::AdmissionError;
pub use events::{ArrivalEvent, BudgetAlertEvent, JobStateChangeEvent};
