mod cli;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use batchgate::{
    AdmissionConfig, AdmissionError, ArrivalDispatcher, ArrivalEvent, BatchClient, BudgetAlertEvent,
    BudgetCircuitBreaker, InMemoryBatch, JobStateChangeEvent, QueueState,
    sanitize_job_name,
};
use cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let result = run(&cli).await;
    if let Err(e) = &result
        && let Some(admission) = e.downcast_ref::<AdmissionError>()
    {
        error!(
            error = %admission,
            transient = admission.batch_error().map(|b| b.is_transient()),
            "invocation failed"
        );
    }
    result
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Sanitize { key } => {
            println!("{}", sanitize_job_name(key));
            Ok(())
        }
        Command::JobState { event } => {
            let payload = read_event(event.as_deref())?;
            let change = JobStateChangeEvent::from_value(&payload)?;
            info!(job_id = %change.job_id, status = %change.status, "{}", change.summary());
            Ok(())
        }
        Command::Arrival { event } => {
            // Validated before the event is read: nothing is processed without a full config.
            let config = AdmissionConfig::load(cli.config.as_deref())?;
            let dispatch = config.dispatch_config()?;
            let payload = read_event(event.as_deref())?;
            let arrival = ArrivalEvent::from_value(&payload)?;
            let dispatcher = ArrivalDispatcher::new(dispatch);

            let outcome = if cli.dry_run {
                let batch = InMemoryBatch::with_queue(&dispatcher.config().queue_id, QueueState::Enabled);
                let outcome = dispatcher.dispatch(&batch, &arrival).await;
                log_dry_run(&batch, &dispatcher.config().queue_id);
                outcome?
            } else {
                let client = BatchClient::from_config(&config.endpoint)
                    .context("building compute service client")?;
                dispatcher.dispatch(&client, &arrival).await?
            };
            println!("{}", serde_json::to_string(&outcome)?);
            Ok(())
        }
        Command::BudgetAlert { event } => {
            let config = AdmissionConfig::load(cli.config.as_deref())?;
            let configured_queue = config.breaker_queue()?;
            let payload = read_event(event.as_deref())?;
            debug!(payload = %payload, "budget alert received");
            let alert = BudgetAlertEvent::from_value(&payload, &configured_queue);
            let breaker = BudgetCircuitBreaker::new();

            let outcome = if cli.dry_run {
                let batch = InMemoryBatch::with_queue(&alert.queue_id, QueueState::Enabled);
                let outcome = breaker.trip(&batch, &alert).await;
                log_dry_run(&batch, &alert.queue_id);
                outcome?
            } else {
                let client = BatchClient::from_config(&config.endpoint)
                    .context("building compute service client")?;
                breaker.trip(&client, &alert).await?
            };
            println!("{}", serde_json::to_string(&outcome)?);
            Ok(())
        }
    }
}

fn log_dry_run(batch: &InMemoryBatch, queue_id: &str) {
    debug!(
        queue = queue_id,
        state = ?batch.queue_state(queue_id),
        submitted = batch.submitted().len(),
        state_changes = batch.state_changes().len(),
        "dry run finished"
    );
}

/// Read one event payload from `path`, or from stdin when no path is given.
fn read_event(path: Option<&Path>) -> Result<Value, AdmissionError> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}
