// crates/core/src/store.rs
//! File-backed job store.
//!
//! Each live job is one `{type}-{id}.json` file under the configured root
//! directory. The store keeps an in-memory cache keyed by `(id, type)` that
//! mirrors every write it performs; the disk stays the source of truth and
//! the cache can go stale if another process touches the same files.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use job_ledger_types::{IdGenerator, JobError, JobKey, JobRecord, DEFAULT_JOB_TYPE};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::filter::JobQuery;
use crate::runner::{RunOutcome, Task, TaskRunner};
use crate::storage;

/// What `write_job_to_disk` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Created,
    Updated,
    Skipped,
}

/// Initial values for a new job. Unset fields take the record defaults:
/// a generated id, type `"job"`, empty meta, status `"initialized"`.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub id: Option<String>,
    pub job_type: Option<String>,
    pub meta: Option<Value>,
    pub status: Option<String>,
    pub status_message: Option<String>,
}

impl NewJob {
    pub fn new(job_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            job_type: Some(job_type.into()),
            ..Self::default()
        }
    }

    pub fn meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn status(mut self, status: impl Into<String>, message: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self.status_message = Some(message.into());
        self
    }
}

/// Result of `create_job`: the live record and whether a file was written.
#[derive(Debug, Clone)]
pub struct CreateJobResult {
    pub job: JobRecord,
    pub write: WriteResult,
}

pub struct JobStore {
    config: StoreConfig,
    cache: BTreeMap<JobKey, JobRecord>,
    /// Set once the cache holds a full scan of the root directory.
    loaded: bool,
    ids: IdGenerator,
}

impl JobStore {
    /// Create the root and archive directories and return a store with an
    /// empty cache.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        storage::ensure_dir(&config.root_dir).await?;
        storage::ensure_dir(&config.archive_dir).await?;
        debug!(
            root = %config.root_dir.display(),
            archive = %config.archive_dir.display(),
            simulate = config.simulate,
            "Opened job store"
        );
        Ok(Self {
            config,
            cache: BTreeMap::new(),
            loaded: false,
            ids: IdGenerator::new(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Point the store at a new root directory. The cache is dropped since it
    /// described the old root.
    pub async fn set_root_dir(&mut self, root_dir: impl Into<PathBuf>) -> StoreResult<()> {
        let root_dir = root_dir.into();
        storage::ensure_dir(&root_dir).await?;
        self.config.root_dir = root_dir;
        self.cache.clear();
        self.loaded = false;
        Ok(())
    }

    pub async fn set_archive_dir(&mut self, archive_dir: impl Into<PathBuf>) -> StoreResult<()> {
        let archive_dir = archive_dir.into();
        storage::ensure_dir(&archive_dir).await?;
        self.config.archive_dir = archive_dir;
        Ok(())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// The cached copy of a job, without touching the disk.
    pub fn cached(&self, key: &JobKey) -> Option<&JobRecord> {
        self.cache.get(key)
    }

    /// Whether the store currently tracks `key` as a live job.
    pub fn is_live(&self, key: &JobKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Create a job unless one with the same `(type, id)` already exists.
    pub async fn create_job(&mut self, init: NewJob) -> StoreResult<CreateJobResult> {
        self.create_job_with(init, false).await
    }

    /// Create a job. Without `overwrite`, an existing record (cached or on
    /// disk) is returned untouched and nothing is written.
    pub async fn create_job_with(
        &mut self,
        init: NewJob,
        overwrite: bool,
    ) -> StoreResult<CreateJobResult> {
        let id = match init.id {
            Some(id) => id,
            None => self.ids.next_id(),
        };
        let job_type = init.job_type.unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string());
        self.ensure_loaded().await?;

        if !overwrite {
            if let Some(existing) = self.get_job(&job_type, &id).await? {
                debug!(job = %existing.key(), "Job already exists, create skipped");
                return Ok(CreateJobResult {
                    job: existing,
                    write: WriteResult::Skipped,
                });
            }
        }

        let mut job = JobRecord::new(job_type, id);
        if let Some(meta) = init.meta {
            job.meta = meta;
        }
        if let Some(status) = init.status {
            job.status = status;
        }
        if let Some(message) = init.status_message {
            job.status_message = message;
        }

        let write = self.write_job_to_disk(&job, overwrite).await?;
        info!(job = %job.key(), write = ?write, "Created job");
        self.cache.insert(job.key(), job.clone());
        Ok(CreateJobResult { job, write })
    }

    /// All cached jobs sorted by id. The root directory is scanned on first
    /// use and again whenever `refresh` is set.
    pub async fn fetch_jobs(&mut self, refresh: bool) -> StoreResult<Vec<JobRecord>> {
        if refresh || !self.loaded {
            self.reload().await?;
        }
        Ok(self.cache.values().cloned().collect())
    }

    /// Jobs matching `query`, in `fetch_jobs` order.
    pub async fn query_jobs(&mut self, query: &JobQuery) -> StoreResult<Vec<JobRecord>> {
        if query.refresh || !self.loaded {
            self.reload().await?;
        }
        Ok(query.apply(self.cache.values()))
    }

    /// Look a job up in the cache, falling back to its file in the root
    /// directory. A job found on disk is added to the cache.
    pub async fn get_job(&mut self, job_type: &str, id: &str) -> StoreResult<Option<JobRecord>> {
        self.ensure_loaded().await?;
        let key = JobKey::new(job_type, id);
        if let Some(job) = self.cache.get(&key) {
            return Ok(Some(job.clone()));
        }
        let path = self.config.job_path(&key);
        let Some(job) = read_optional(&path).await? else {
            return Ok(None);
        };
        debug!(job = %key, "Loaded job from disk");
        self.cache.insert(job.key(), job.clone());
        Ok(Some(job))
    }

    /// Read an archived job. The record is not added to the live cache.
    pub async fn get_archived_job(
        &self,
        job_type: &str,
        id: &str,
    ) -> StoreResult<Option<JobRecord>> {
        let key = JobKey::new(job_type, id);
        read_optional(&self.config.archive_path(&key)).await
    }

    /// Drop a job from the cache and delete its file. Deleting a file that is
    /// already gone is `StoreError::NotFound`.
    pub async fn remove_job(&mut self, job: &JobRecord) -> StoreResult<()> {
        let key = job.key();
        self.cache.remove(&key);
        if self.config.simulate {
            debug!(job = %key, "Simulated remove");
            return Ok(());
        }
        storage::remove_file(&self.config.job_path(&key)).await?;
        info!(job = %key, "Removed job");
        Ok(())
    }

    /// Drop a job from the cache and move its file into the archive directory.
    ///
    /// The file is moved as-is: unsaved changes on `job` are not written.
    pub async fn archive_job(&mut self, job: &JobRecord) -> StoreResult<()> {
        let key = job.key();
        self.cache.remove(&key);
        if self.config.simulate {
            debug!(job = %key, "Simulated archive");
            return Ok(());
        }
        let from = self.config.job_path(&key);
        let to = self.config.archive_path(&key);
        storage::rename_file(&from, &to).await?;
        info!(job = %key, archive = %to.display(), "Archived job");
        Ok(())
    }

    /// Move an archived job back into the root directory and track it again.
    pub async fn restore_job(&mut self, job_type: &str, id: &str) -> StoreResult<JobRecord> {
        let key = JobKey::new(job_type, id);
        let live_path = self.config.job_path(&key);
        if self.cache.contains_key(&key) || storage::exists(&live_path).await? {
            return Err(StoreError::Duplicate { key });
        }
        let archive_path = self.config.archive_path(&key);
        let job = read_job_file(&archive_path).await?;
        if !self.config.simulate {
            storage::rename_file(&archive_path, &live_path).await?;
        }
        info!(job = %key, "Restored job from archive");
        self.cache.insert(key, job.clone());
        Ok(job)
    }

    /// Persist `job` to its file in the root directory.
    ///
    /// Without `overwrite` an existing file is left alone and `Skipped` is
    /// returned. In simulate mode nothing is written and the result is always
    /// `Skipped`.
    pub async fn write_job_to_disk(
        &self,
        job: &JobRecord,
        overwrite: bool,
    ) -> StoreResult<WriteResult> {
        let key = job.key();
        let path = self.config.job_path(&key);
        let existed = storage::exists(&path).await?;
        if existed && !overwrite {
            return Ok(WriteResult::Skipped);
        }
        if self.config.simulate {
            debug!(job = %key, "Simulated write");
            return Ok(WriteResult::Skipped);
        }
        let json = job.to_json().map_err(|e| StoreError::Serialize {
            key: key.clone(),
            message: e.to_string(),
        })?;
        storage::write_string(&path, &json).await?;
        debug!(job = %key, path = %path.display(), "Wrote job");
        Ok(if existed {
            WriteResult::Updated
        } else {
            WriteResult::Created
        })
    }

    /// Write `job` (overwriting) and refresh its cache entry.
    pub async fn save_job(&mut self, job: &JobRecord) -> StoreResult<WriteResult> {
        let write = self.write_job_to_disk(job, true).await?;
        self.cache.insert(job.key(), job.clone());
        Ok(write)
    }

    pub async fn set_status(
        &mut self,
        job: &mut JobRecord,
        status: impl Into<String>,
        message: impl Into<String>,
    ) -> StoreResult<()> {
        job.set_status(status, message);
        self.save_job(job).await?;
        Ok(())
    }

    /// Shallow-merge `meta` into the job's meta (see `JobRecord::merge_meta`).
    pub async fn set_meta(&mut self, job: &mut JobRecord, meta: Value) -> StoreResult<()> {
        job.merge_meta(meta);
        self.save_job(job).await?;
        Ok(())
    }

    pub async fn write_to_log(
        &mut self,
        job: &mut JobRecord,
        message: impl Into<String>,
    ) -> StoreResult<()> {
        let message = message.into();
        info!(job = %job.key(), "{message}");
        job.append_log(message);
        self.save_job(job).await?;
        Ok(())
    }

    pub async fn set_error(&mut self, job: &mut JobRecord, error: JobError) -> StoreResult<()> {
        job.set_error(error);
        self.save_job(job).await?;
        Ok(())
    }

    pub async fn clear_error(&mut self, job: &mut JobRecord) -> StoreResult<()> {
        job.clear_error();
        self.save_job(job).await?;
        Ok(())
    }

    /// Run `task` over every job matching `query`. See `TaskRunner::run`.
    pub async fn run_task<T>(&mut self, query: JobQuery, task: &T) -> StoreResult<RunOutcome>
    where
        T: Task + ?Sized,
    {
        TaskRunner::new(query).run(self, task).await
    }

    /// Scan the root directory unless an earlier scan already filled the cache.
    async fn ensure_loaded(&mut self) -> StoreResult<()> {
        if !self.loaded {
            self.reload().await?;
        }
        Ok(())
    }

    /// Replace the cache with every readable job file in the root directory.
    /// Malformed files are skipped with a warning.
    async fn reload(&mut self) -> StoreResult<()> {
        let files = storage::scan_json_files(&self.config.root_dir).await?;
        let mut cache = BTreeMap::new();
        for path in files {
            match read_job_file(&path).await {
                Ok(job) => {
                    if let Some(previous) = cache.insert(job.key(), job) {
                        warn!(
                            job = %previous.key(),
                            path = %path.display(),
                            "Duplicate job identity on disk, keeping the later file"
                        );
                    }
                }
                Err(e) => {
                    warn!("Skipping unreadable job file {}: {}", path.display(), e);
                }
            }
        }
        debug!(
            root = %self.config.root_dir.display(),
            count = cache.len(),
            "Loaded jobs from disk"
        );
        self.cache = cache;
        self.loaded = true;
        Ok(())
    }
}

async fn read_job_file(path: &Path) -> StoreResult<JobRecord> {
    let contents = storage::read_to_string(path).await?;
    JobRecord::from_json(&contents).map_err(|e| StoreError::MalformedJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

async fn read_optional(path: &Path) -> StoreResult<Option<JobRecord>> {
    match read_job_file(path).await {
        Ok(job) => Ok(Some(job)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
