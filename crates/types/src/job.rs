// crates/types/src/job.rs
//! The persisted job record and its parts.
//!
//! A `JobRecord` is plain data. Mutating methods here only change the value
//! and bump `updated_at`; persisting the result is the store's job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use ts_rs::TS;

use crate::time::now_iso;

/// Type tag used when a job is created without one.
pub const DEFAULT_JOB_TYPE: &str = "job";

/// Status every new job starts in.
pub const INITIAL_STATUS: &str = "initialized";

/// Unique identity of a job: `(type, id)`.
///
/// Field order matters: the derived `Ord` sorts by `id` first, then by type,
/// which is the order the store hands jobs out in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobKey {
    pub id: String,
    pub job_type: String,
}

impl JobKey {
    pub fn new(job_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            job_type: job_type.into(),
        }
    }

    /// Backing file name: `{type}-{id}.json`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.job_type, self.id)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.job_type, self.id)
    }
}

/// One line in a job's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../bindings/"))]
pub struct LogEntry {
    pub ts: String,
    pub message: String,
}

/// Failure captured from a task run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../bindings/"))]
pub struct JobError {
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl JobError {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Shape used for failures that carry no name or trace (e.g. a panic payload).
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new("UnknownError", message, "")
    }
}

fn default_meta() -> Value {
    Value::Object(Map::new())
}

fn default_status() -> String {
    INITIAL_STATUS.to_string()
}

/// A job as stored on disk, one JSON document per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../bindings/"))]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default = "default_meta")]
    #[ts(type = "Record<string, unknown> | unknown")]
    pub meta: Value,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub log: Vec<LogEntry>,
    #[serde(default)]
    pub error: Option<JobError>,
}

impl JobRecord {
    /// Fresh record in the initial status with empty meta, log and error.
    pub fn new(job_type: impl Into<String>, id: impl Into<String>) -> Self {
        let now = now_iso();
        Self {
            id: id.into(),
            job_type: job_type.into(),
            created_at: now.clone(),
            updated_at: now,
            meta: default_meta(),
            status: default_status(),
            status_message: String::new(),
            log: Vec::new(),
            error: None,
        }
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(&self.job_type, &self.id)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Look up a top-level meta attribute. `None` when meta is not an object.
    pub fn meta_get(&self, key: &str) -> Option<&Value> {
        self.meta.as_object().and_then(|m| m.get(key))
    }

    pub fn touch(&mut self) {
        self.updated_at = now_iso();
    }

    pub fn set_status(&mut self, status: impl Into<String>, message: impl Into<String>) {
        self.touch();
        self.status = status.into();
        self.status_message = message.into();
    }

    /// Shallow-merge an object into meta. Anything that is not an object (or
    /// an object landing on non-object meta) replaces meta wholesale.
    pub fn merge_meta(&mut self, meta: Value) {
        self.touch();
        match (&mut self.meta, meta) {
            (Value::Object(current), Value::Object(incoming)) => current.extend(incoming),
            (current, incoming) => *current = incoming,
        }
    }

    pub fn append_log(&mut self, message: impl Into<String>) {
        self.touch();
        self.log.push(LogEntry {
            ts: self.updated_at.clone(),
            message: message.into(),
        });
    }

    pub fn set_error(&mut self, error: JobError) {
        self.touch();
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.touch();
        self.error = None;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_new_record_defaults() {
        let job = JobRecord::new("main", "1");
        assert_eq!(job.status, "initialized");
        assert_eq!(job.status_message, "");
        assert_eq!(job.meta, json!({}));
        assert!(job.log.is_empty());
        assert!(job.error.is_none());
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let mut job = JobRecord::new("job", "07");
        job.merge_meta(json!({"index": 7, "nested": {"a": [1, 2]}}));
        job.set_status("running", "halfway");
        job.append_log("first");
        job.append_log("second");
        job.set_error(JobError::new("Error", "boom", "[\"boom\"]"));

        let back = JobRecord::from_json(&job.to_json().unwrap()).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_serialized_field_names() {
        let job = JobRecord::new("main", "1");
        let value: Value = serde_json::from_str(&job.to_json().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "type",
            "createdAt",
            "updatedAt",
            "meta",
            "status",
            "statusMessage",
            "log",
            "error",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["error"], Value::Null);
    }

    #[test]
    fn test_deserialize_minimal_document() {
        let json = r#"{
            "id": "1",
            "type": "main",
            "createdAt": "2026-01-25T16:42:56.852Z",
            "updatedAt": "2026-01-25T16:42:56.852Z"
        }"#;
        let job = JobRecord::from_json(json).unwrap();
        assert_eq!(job.status, INITIAL_STATUS);
        assert_eq!(job.meta, json!({}));
        assert!(job.log.is_empty());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_merge_meta_is_shallow_union() {
        let mut job = JobRecord::new("job", "1");
        job.merge_meta(json!({"a": 1, "b": {"x": 1}}));
        job.merge_meta(json!({"b": {"y": 2}, "c": 3}));
        assert_eq!(job.meta, json!({"a": 1, "b": {"y": 2}, "c": 3}));
    }

    #[test]
    fn test_merge_meta_non_object_replaces() {
        let mut job = JobRecord::new("job", "1");
        job.merge_meta(json!({"a": 1}));
        job.merge_meta(json!(42));
        assert_eq!(job.meta, json!(42));

        job.merge_meta(json!({"b": 2}));
        assert_eq!(job.meta, json!({"b": 2}));
        assert_eq!(job.meta_get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_mutations_bump_updated_at() {
        const STALE: &str = "2000-01-01T00:00:00.000Z";
        let mutations: [(&str, fn(&mut JobRecord)); 5] = [
            ("set_status", |j: &mut JobRecord| j.set_status("done", "")),
            ("merge_meta", |j: &mut JobRecord| j.merge_meta(json!({"a": 1}))),
            ("append_log", |j: &mut JobRecord| j.append_log("hello")),
            ("set_error", |j: &mut JobRecord| j.set_error(JobError::new("Error", "bad", "[]"))),
            ("clear_error", |j: &mut JobRecord| j.clear_error()),
        ];

        for (name, mutate) in mutations {
            let mut job = JobRecord::new("job", "1");
            job.updated_at = STALE.into();
            mutate(&mut job);
            assert_ne!(job.updated_at, STALE, "{name} did not bump updatedAt");
            assert_eq!(job.updated_at.len(), 24, "{name}");
            assert_eq!(job.created_at.len(), 24);
        }
    }

    #[test]
    fn test_log_is_append_only_in_order() {
        let mut job = JobRecord::new("job", "1");
        job.append_log("a");
        job.append_log("b");
        job.append_log("c");
        let messages: Vec<_> = job.log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_key_file_name_and_ordering() {
        let key = JobKey::new("main", "1");
        assert_eq!(key.file_name(), "main-1.json");
        assert_eq!(key.to_string(), "main-1");

        // Lexicographic, not numeric.
        let mut keys = vec![
            JobKey::new("job", "10"),
            JobKey::new("job", "9"),
            JobKey::new("job", "01"),
        ];
        keys.sort();
        let ids: Vec<_> = keys.iter().map(|k| k.id.as_str()).collect();
        assert_eq!(ids, vec!["01", "10", "9"]);
    }
}
