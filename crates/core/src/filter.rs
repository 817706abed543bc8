// crates/core/src/filter.rs
//! Job selection: per-field filters and the query that combines them.

use std::collections::BTreeSet;

use job_ledger_types::JobRecord;

/// Match rule for a single string field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    /// Matches every value.
    #[default]
    Any,
    Equals(String),
    OneOf(BTreeSet<String>),
}

impl Filter {
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(value.into())
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Filter::Any => true,
            Filter::Equals(expected) => expected == value,
            Filter::OneOf(set) => set.contains(value),
        }
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Self::equals(value)
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Self::Equals(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for Filter {
    fn from(values: Vec<S>) -> Self {
        Self::one_of(values)
    }
}

/// Which jobs to select and how many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub job_type: Filter,
    pub status: Filter,
    /// Cap on returned jobs; `None` or `Some(0)` means no cap.
    pub limit: Option<usize>,
    /// Re-scan the root directory before filtering.
    pub refresh: bool,
}

impl JobQuery {
    /// Matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(job_type: impl Into<Filter>, status: impl Into<Filter>) -> Self {
        Self {
            job_type: job_type.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn job_type(mut self, filter: impl Into<Filter>) -> Self {
        self.job_type = filter.into();
        self
    }

    pub fn status(mut self, filter: impl Into<Filter>) -> Self {
        self.status = filter.into();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        self.job_type.matches(&job.job_type) && self.status.matches(&job.status)
    }

    /// Filter `jobs` keeping their order, then apply the limit.
    pub fn apply<'a, I>(&self, jobs: I) -> Vec<JobRecord>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let matched = jobs.into_iter().filter(|job| self.matches(job)).cloned();
        match self.limit {
            Some(limit) if limit > 0 => matched.take(limit).collect(),
            _ => matched.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(job_type: &str, id: &str, status: &str) -> JobRecord {
        let mut job = JobRecord::new(job_type, id);
        job.status = status.to_string();
        job
    }

    fn fixture() -> Vec<JobRecord> {
        vec![
            job("A", "1", "init"),
            job("A", "2", "done"),
            job("B", "3", "init"),
            job("B", "4", "done"),
            job("C", "5", "done"),
        ]
    }

    fn ids(jobs: &[JobRecord]) -> Vec<&str> {
        jobs.iter().map(|j| j.id.as_str()).collect()
    }

    #[test]
    fn test_filter_variants() {
        assert!(Filter::Any.matches("anything"));
        assert!(Filter::equals("a").matches("a"));
        assert!(!Filter::equals("a").matches("b"));
        let set = Filter::one_of(["a", "b"]);
        assert!(set.matches("b"));
        assert!(!set.matches("c"));
    }

    #[test]
    fn test_query_type_and_status() {
        let jobs = fixture();
        let result = JobQuery::new("A", "done").apply(&jobs);
        assert_eq!(ids(&result), vec!["2"]);
    }

    #[test]
    fn test_query_type_union() {
        let jobs = fixture();
        let result = JobQuery::all().job_type(vec!["A", "B"]).apply(&jobs);
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_query_without_filters_matches_all() {
        let jobs = fixture();
        assert_eq!(JobQuery::all().apply(&jobs).len(), 5);
    }

    #[test]
    fn test_query_limit_preserves_order() {
        let jobs = fixture();
        let result = JobQuery::all().status("done").limit(2).apply(&jobs);
        assert_eq!(ids(&result), vec!["2", "4"]);
    }

    #[test]
    fn test_zero_limit_is_uncapped() {
        let jobs = fixture();
        assert_eq!(JobQuery::all().limit(0).apply(&jobs).len(), 5);
    }
}
