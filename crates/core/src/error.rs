// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use job_ledger_types::JobKey;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed job JSON in {path}: {message}")]
    MalformedJson { path: PathBuf, message: String },

    #[error("Failed to serialize job {key}: {message}")]
    Serialize { key: JobKey, message: String },

    #[error("Job {key} is already live in the root directory")]
    Duplicate { key: JobKey },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// A named failure raised by a task.
///
/// Tasks return `anyhow::Result`; wrapping a failure in `TaskError` controls
/// the `name` recorded on the job.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskError {
    pub name: String,
    pub message: String,
}

impl TaskError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}
