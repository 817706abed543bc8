// crates/core/src/render.rs
//! Failure-safe rendering of errors and panic payloads for storage in a job's
//! `error` field. Nothing in here returns an error or panics.

use serde::Serialize;
use std::any::Any;
use std::backtrace::BacktraceStatus;

/// JSON text for `value`, or a JSON string of its debug form if serde fails.
pub fn to_json_lossy<T: Serialize + std::fmt::Debug + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| {
        serde_json::to_string(&format!("{value:?}")).unwrap_or_else(|_| "null".to_string())
    })
}

/// Messages of `err` and its sources, outermost first. A message identical to
/// one already seen is dropped; wrappers commonly repeat their source.
pub fn error_chain(err: &anyhow::Error) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for cause in err.chain() {
        let message = cause.to_string();
        if !seen.contains(&message) {
            seen.push(message);
        }
    }
    seen
}

/// Stack text stored for a structured task failure: the JSON array of the
/// cause chain followed by the backtrace lines, when one was captured.
pub fn error_stack(err: &anyhow::Error) -> String {
    let mut lines = error_chain(err);
    let backtrace = err.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        lines.extend(backtrace.to_string().lines().map(str::to_string));
    }
    to_json_lossy(&lines)
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
