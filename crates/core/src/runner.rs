// crates/core/src/runner.rs
//! Batch execution of a task over the jobs matching a query.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

use job_ledger_types::{JobError, JobKey, JobRecord};

use crate::error::{StoreError, StoreResult, TaskError};
use crate::filter::JobQuery;
use crate::render::{error_stack, panic_message, to_json_lossy};
use crate::store::JobStore;

/// Caller-supplied work applied to one job at a time.
///
/// `jobs` is the full list matched for this run and `index` is the position
/// of `job` in it. Changes meant to last must go through the store
/// (`store.set_status(job, ..)` and friends), which writes them to disk.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(
        &self,
        store: &mut JobStore,
        job: &mut JobRecord,
        index: usize,
        jobs: &[JobRecord],
    ) -> anyhow::Result<()>;
}

/// Which jobs a run touched and how each one ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub matched: usize,
    pub succeeded: Vec<JobKey>,
    pub failed: Vec<JobKey>,
    /// Matched jobs an earlier task in the same run archived or removed.
    pub skipped: Vec<JobKey>,
}

impl RunOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TaskRunner {
    query: JobQuery,
}

impl TaskRunner {
    pub fn new(query: JobQuery) -> Self {
        Self { query }
    }

    /// Apply `task` to every job matching the query, one after another in
    /// query order.
    ///
    /// A task that returns `Err` or panics has the failure recorded on the
    /// job it was running for, and the run moves on to the next job. Jobs
    /// that stopped being live before their turn are skipped, not run. The
    /// only error returned from here is a failed query.
    pub async fn run<T>(&self, store: &mut JobStore, task: &T) -> StoreResult<RunOutcome>
    where
        T: Task + ?Sized,
    {
        let jobs = store.query_jobs(&self.query).await?;
        info!(matched = jobs.len(), "Running task");

        let mut outcome = RunOutcome {
            matched: jobs.len(),
            ..RunOutcome::default()
        };

        for (index, snapshot) in jobs.iter().enumerate() {
            let key = snapshot.key();
            // An earlier task may have changed this job; start from the live copy.
            let Some(mut job) = store.cached(&key).cloned() else {
                debug!(job = %key, index, "Job is no longer live, skipped");
                outcome.skipped.push(key);
                continue;
            };

            let result = AssertUnwindSafe(task.run(store, &mut job, index, &jobs))
                .catch_unwind()
                .await;

            let failure = match result {
                Ok(Ok(())) => {
                    debug!(job = %key, index, "Task succeeded");
                    outcome.succeeded.push(key);
                    continue;
                }
                Ok(Err(err)) => structured_error(&err),
                Err(payload) => JobError::unknown(to_json_lossy(&panic_message(&*payload))),
            };

            error!(
                job = %key,
                index,
                name = %failure.name,
                message = %failure.message,
                "Task failed"
            );
            record_failure(store, &mut job, failure).await;
            outcome.failed.push(key);
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "Task run finished"
        );
        Ok(outcome)
    }
}

/// `{name, message, stack}` for an error returned by a task.
fn structured_error(err: &anyhow::Error) -> JobError {
    let name = if let Some(task_err) = err.downcast_ref::<TaskError>() {
        task_err.name.clone()
    } else if err.downcast_ref::<StoreError>().is_some() {
        "StoreError".to_string()
    } else if err.downcast_ref::<std::io::Error>().is_some() {
        "IoError".to_string()
    } else {
        "Error".to_string()
    };
    JobError::new(name, err.to_string(), error_stack(err))
}

/// Persist `failure` on `job` if the store still tracks it. A task that
/// archived or removed its job keeps that outcome; the failure is only logged.
async fn record_failure(store: &mut JobStore, job: &mut JobRecord, failure: JobError) {
    let key = job.key();
    if !store.is_live(&key) {
        warn!(job = %key, "Job is no longer live, task error not persisted");
        return;
    }
    if let Err(e) = store.set_error(job, failure).await {
        error!(job = %key, error = %e, "Failed to persist task error");
    }
}
