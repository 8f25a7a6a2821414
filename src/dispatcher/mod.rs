//! Bounded-concurrency batch dispatch.
//!
//! The [`Dispatcher`] fans a list of inputs out to one task per item:
//! - [`slots`] - Index-owned, write-once result collection
//! - [`worker`] - Per-item request, retry and outcome recording
//!
//! At most `max_concurrent` items are in flight at any instant. A semaphore
//! permit is taken before each task is spawned and released when that task has
//! written its result. [`Dispatcher::run`] returns only after every task has
//! finished, with results ordered by input position.

pub mod slots;
mod worker;


pub use slots::ResultSlots;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{Config, RequestConfig};
use crate::error::{Error, Result};
use crate::invoker::{HttpInvoker, Invoker};
use crate::retry::RetryPolicy;
use crate::types::{BatchSummary, InputItem, ProcessResult};

use worker::WorkerContext;

/// Runs a batch of inputs through the invoker with bounded parallelism
///
/// Cheap to clone; the invoker is shared by every worker of every batch.
#[derive(Clone)]
pub struct Dispatcher {
    context: WorkerContext,
    max_concurrent: usize,
}

impl Dispatcher {
    /// Build a dispatcher that sends requests over HTTP as configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let invoker = HttpInvoker::new(&config.api)?;
        Self::new(Arc::new(invoker), config)
    }

    /// Build a dispatcher around any invoker, taking limits from `config`
    pub fn new(invoker: Arc<dyn Invoker>, config: &Config) -> Result<Self> {
        Self::with_parts(
            invoker,
            config.request.clone(),
            config.retry.policy(),
            config.dispatch.max_concurrent,
        )
    }

    /// Build a dispatcher from its individual parts
    ///
    /// Fails when `max_concurrent` is zero, since no item could ever start.
    pub fn with_parts(
        invoker: Arc<dyn Invoker>,
        request: RequestConfig,
        retry: RetryPolicy,
        max_concurrent: usize,
    ) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(Error::config(
                "dispatch.max_concurrent",
                "must be at least 1",
            ));
        }
        Ok(Self {
            context: WorkerContext {
                invoker,
                request: Arc::new(request),
                retry,
            },
            max_concurrent,
        })
    }

    /// Maximum number of items in flight at once
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Process every input and return one result per input, in input order
    ///
    /// Per-item failures are recorded in the results; nothing here aborts the
    /// batch. The returned vector always has `inputs.len()` entries and entry
    /// `i` belongs to `inputs[i]`.
    pub async fn run(&self, inputs: Vec<String>) -> Vec<ProcessResult> {
        let total = inputs.len();
        if total == 0 {
            return Vec::new();
        }

        let started = Instant::now();
        tracing::info!(
            total,
            max_concurrent = self.max_concurrent,
            max_attempts = self.context.retry.max_attempts(),
            "dispatching batch"
        );

        let inputs: Arc<[String]> = inputs.into();
        let slots = ResultSlots::with_len(total);
        let peak_retained = self.dispatch_all(&inputs, &slots).await;

        let results = slots.into_results(&inputs);
        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            api_failed = summary.api_failed,
            errored = summary.errored,
            elapsed_ms = started.elapsed().as_millis(),
            peak_retained,
            "batch complete"
        );

        results
    }

    /// Spawn one worker per input and wait for all of them
    ///
    /// Finished tasks are reaped before each admission, so the set of task
    /// handles held at any time stays near `max_concurrent` rather than
    /// growing with the batch. Returns the largest number of handles held.
    async fn dispatch_all(&self, inputs: &Arc<[String]>, slots: &ResultSlots) -> usize {
        let gate = Arc::new(Semaphore::new(self.max_concurrent));
        let mut workers = JoinSet::new();
        let mut peak_retained = 0;

        for index in 0..inputs.len() {
            reap_finished(&mut workers);

            // Blocks while max_concurrent items are in flight
            let Ok(permit) = Arc::clone(&gate).acquire_owned().await else {
                tracing::error!(index, "admission gate closed, remaining items not dispatched");
                break;
            };

            let item = InputItem {
                index,
                text: inputs[index].clone(),
            };
            let context = self.context.clone();
            let slots = slots.clone();

            workers.spawn(async move {
                let result = context.process(item).await;
                if let Err(e) = slots.fill(result) {
                    tracing::error!(index, error = %e, "failed to record result");
                }
                drop(permit);
            });
            peak_retained = peak_retained.max(workers.len());
        }

        // Completion barrier
        while let Some(joined) = workers.join_next().await {
            log_join_error(joined);
        }

        peak_retained
    }
}

/// Join every task that has already finished, without waiting
fn reap_finished(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.try_join_next() {
        log_join_error(joined);
    }
}

fn log_join_error(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "worker task ended abnormally");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("max_concurrent", &self.max_concurrent)
            .field("retry", &self.context.retry)
            .finish_non_exhaustive()
    }
}
