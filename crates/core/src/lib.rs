// crates/core/src/lib.rs
//! File-backed job records and a fault-isolating batch runner.
//!
//! - `JobStore`: one JSON file per job, cached in memory
//! - `TaskRunner` / `Task`: apply async work to every job matching a `JobQuery`
//! - `StoreConfig`: root and archive directories

pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod render;
pub mod runner;
pub mod storage;
pub mod store;

pub use config::StoreConfig;
pub use error::*;
pub use filter::{Filter, JobQuery};
pub use runner::{RunOutcome, Task, TaskRunner};
pub use store::{CreateJobResult, JobStore, NewJob, WriteResult};

pub use job_ledger_types::{JobError, JobKey, JobRecord, LogEntry};
