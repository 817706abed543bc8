// crates/core/src/config.rs
//! Store configuration.

use std::path::{Path, PathBuf};

use job_ledger_types::JobKey;

pub const ROOT_DIR_ENV: &str = "JOB_LEDGER_ROOT_DIR";
pub const ARCHIVE_DIR_ENV: &str = "JOB_LEDGER_ARCHIVE_DIR";
pub const SIMULATE_ENV: &str = "JOB_LEDGER_SIMULATE";

/// Where a `JobStore` keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Live jobs, one `{type}-{id}.json` per job.
    pub root_dir: PathBuf,
    /// Archived jobs, same file naming as the root.
    pub archive_dir: PathBuf,
    /// When set, nothing is written, deleted or renamed on disk.
    pub simulate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./jobs"),
            archive_dir: PathBuf::from("./jobs/archive"),
            simulate: false,
        }
    }
}

impl StoreConfig {
    /// Config rooted at `root_dir`, archiving into `root_dir/archive`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            archive_dir: root_dir.join("archive"),
            root_dir,
            simulate: false,
        }
    }

    /// Defaults overridden by `JOB_LEDGER_ROOT_DIR`, `JOB_LEDGER_ARCHIVE_DIR`
    /// and `JOB_LEDGER_SIMULATE` (`1` or `true`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(ROOT_DIR_ENV) {
            config = Self::new(root);
        }
        if let Ok(archive) = std::env::var(ARCHIVE_DIR_ENV) {
            config.archive_dir = PathBuf::from(archive);
        }
        config.simulate = std::env::var(SIMULATE_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        config
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn with_archive_dir(mut self, archive_dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = archive_dir.into();
        self
    }

    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// `{root_dir}/{type}-{id}.json`
    pub fn job_path(&self, key: &JobKey) -> PathBuf {
        self.root_dir.join(key.file_name())
    }

    /// `{archive_dir}/{type}-{id}.json`
    pub fn archive_path(&self, key: &JobKey) -> PathBuf {
        self.archive_dir.join(key.file_name())
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dirs() {
        let config = StoreConfig::default();
        assert_eq!(config.root_dir, PathBuf::from("./jobs"));
        assert_eq!(config.archive_dir, PathBuf::from("./jobs/archive"));
        assert!(!config.simulate);
    }

    #[test]
    fn test_new_nests_archive_under_root() {
        let config = StoreConfig::new("/var/jobs");
        assert_eq!(config.archive_dir, PathBuf::from("/var/jobs/archive"));
    }

    #[test]
    fn test_paths_use_type_dash_id() {
        let config = StoreConfig::new("/r").with_archive_dir("/a");
        let key = JobKey::new("main", "1");
        assert_eq!(config.job_path(&key), PathBuf::from("/r/main-1.json"));
        assert_eq!(config.archive_path(&key), PathBuf::from("/a/main-1.json"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
