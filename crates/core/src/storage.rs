// crates/core/src/storage.rs
//! File-system primitives the store is built on.
//!
//! Every function maps OS errors into `StoreError` with the offending path.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// Directories never scanned for job files.
const IGNORED_DIRS: &[&str] = &["node_modules"];

/// Recursive `mkdir -p`.
pub async fn ensure_dir(dir: &Path) -> StoreResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StoreError::io(dir, e))
}

/// All `*.json` files directly inside `dir`, in file-name order.
///
/// Fails only when `dir` itself cannot be read; unreadable entries are
/// logged and skipped.
pub fn list_json_files(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !e.file_name()
                .to_str()
                .is_some_and(|name| IGNORED_DIRS.contains(&name))
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                return Err(StoreError::io(dir, source));
            }
            Err(e) => {
                warn!("Failed to read directory entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

/// `list_json_files` run on the blocking pool.
pub async fn scan_json_files(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let owned = dir.to_path_buf();
    tokio::task::spawn_blocking(move || list_json_files(&owned))
        .await
        .map_err(|e| StoreError::io(dir, std::io::Error::other(e)))?
}

pub async fn read_to_string(path: &Path) -> StoreResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Write `contents` to `path`, replacing any existing file.
pub async fn write_string(path: &Path, contents: &str) -> StoreResult<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| StoreError::io(path, e))
}

pub async fn remove_file(path: &Path) -> StoreResult<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Move `from` to `to`. Errors are reported against the source path.
pub async fn rename_file(from: &Path, to: &Path) -> StoreResult<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| StoreError::io(from, e))
}

pub async fn exists(path: &Path) -> StoreResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}
