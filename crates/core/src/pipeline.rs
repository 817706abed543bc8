// crates/core/src/pipeline.rs
//! A three-stage fan-out pipeline built from store tasks.
//!
//! A `main` job carrying `{"count": n}` generates `n` child jobs of type
//! `job`, every child is processed to `complete`, and once all children are
//! complete the main job is completed and archived.

use async_trait::async_trait;
use serde_json::json;

use job_ledger_types::JobRecord;

use crate::error::{StoreResult, TaskError};
use crate::filter::JobQuery;
use crate::runner::{RunOutcome, Task};
use crate::store::{JobStore, NewJob};

pub const MAIN_TYPE: &str = "main";
pub const CHILD_TYPE: &str = "job";
pub const INITIALIZED: &str = "initialized";
pub const COMPLETE: &str = "complete";

/// Creates one child per unit of the main job's `meta.count`.
///
/// Children are `job/00`, `job/01`, ... and are reused if they already exist.
/// A missing or non-numeric count does nothing.
pub struct GenerateChildren;

#[async_trait]
impl Task for GenerateChildren {
    async fn run(
        &self,
        store: &mut JobStore,
        job: &mut JobRecord,
        _index: usize,
        _jobs: &[JobRecord],
    ) -> anyhow::Result<()> {
        let Some(count) = job.meta_get("count").and_then(|c| c.as_u64()) else {
            return Ok(());
        };
        if count == 0 {
            return Ok(());
        }
        store.write_to_log(job, "# Generating child jobs").await?;

        for i in 0..count {
            let id = format!("{i:02}");
            let mut child = match store.get_job(CHILD_TYPE, &id).await? {
                Some(child) => child,
                None => {
                    store
                        .create_job(NewJob::new(CHILD_TYPE, id).meta(json!({ "index": i })))
                        .await?
                        .job
                }
            };
            let message = format!("Created child {} by job {}", child.key(), job.key());
            store.write_to_log(&mut child, message).await?;
        }
        Ok(())
    }
}

/// Marks a child job complete.
pub struct CompleteJob;

#[async_trait]
impl Task for CompleteJob {
    async fn run(
        &self,
        store: &mut JobStore,
        job: &mut JobRecord,
        _index: usize,
        _jobs: &[JobRecord],
    ) -> anyhow::Result<()> {
        store.write_to_log(job, "# Processing job").await?;
        store.set_meta(job, json!({ "prop": "value" })).await?;
        store.write_to_log(job, "Setting status to _complete_").await?;
        store.set_status(job, COMPLETE, "Job complete").await?;
        Ok(())
    }
}

/// Archives whatever job it is given.
pub struct ArchiveJob;

#[async_trait]
impl Task for ArchiveJob {
    async fn run(
        &self,
        store: &mut JobStore,
        job: &mut JobRecord,
        _index: usize,
        _jobs: &[JobRecord],
    ) -> anyhow::Result<()> {
        store.write_to_log(job, "# Archiving job").await?;
        store.archive_job(job).await?;
        Ok(())
    }
}

/// Completes and archives the main job once every child is complete.
///
/// Fails the main job's run while children are still outstanding, so it
/// stays `initialized` and is picked up again by the next check.
pub struct CheckChildren {
    /// Also archive the completed children.
    pub archive_children: bool,
}

#[async_trait]
impl Task for CheckChildren {
    async fn run(
        &self,
        store: &mut JobStore,
        job: &mut JobRecord,
        _index: usize,
        _jobs: &[JobRecord],
    ) -> anyhow::Result<()> {
        let done = store
            .query_jobs(&JobQuery::new(CHILD_TYPE, COMPLETE))
            .await?;
        let expected = job.meta_get("count").and_then(|c| c.as_u64());
        if expected != Some(done.len() as u64) {
            return Err(TaskError::new("Error", "Not all jobs complete").into());
        }

        store.write_to_log(job, "All jobs complete").await?;
        store.set_status(job, COMPLETE, "All jobs complete").await?;
        if self.archive_children {
            store
                .run_task(JobQuery::new(CHILD_TYPE, COMPLETE), &ArchiveJob)
                .await?;
        }
        store.archive_job(job).await?;
        Ok(())
    }
}

/// Outcome of each stage of `run_pipeline`.
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub generated: RunOutcome,
    pub processed: RunOutcome,
    pub checked: RunOutcome,
}

/// Options for `run_pipeline`.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub count: u64,
    /// Cap on children processed by the processing stage.
    pub chunk_size: Option<usize>,
    pub archive_children: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            count: 5,
            chunk_size: None,
            archive_children: false,
        }
    }
}

/// Create `main/1` and drive it through generate, process and check.
pub async fn run_pipeline(
    store: &mut JobStore,
    options: &PipelineOptions,
) -> StoreResult<PipelineSummary> {
    let mut main = store
        .create_job(NewJob::new(MAIN_TYPE, "1").meta(json!({ "count": options.count })))
        .await?
        .job;
    store.write_to_log(&mut main, "Created main job").await?;

    let generated = store
        .run_task(JobQuery::new(MAIN_TYPE, INITIALIZED), &GenerateChildren)
        .await?;

    let mut process = JobQuery::new(CHILD_TYPE, INITIALIZED);
    process.limit = options.chunk_size;
    let processed = store.run_task(process, &CompleteJob).await?;

    let checked = store
        .run_task(
            JobQuery::new(MAIN_TYPE, INITIALIZED),
            &CheckChildren {
                archive_children: options.archive_children,
            },
        )
        .await?;

    Ok(PipelineSummary {
        generated,
        processed,
        checked,
    })
}
