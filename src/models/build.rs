//! Build and job outcome records as persisted in the store.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TestStatus;

/// Metadata for one CI build, written once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BuildRecord {
    /// CI build id (monotonic)
    pub build_id: i64,
    /// Abbreviated commit sha
    #[serde(rename = "sha")]
    pub short_sha: String,
    /// Full commit message
    pub commit_message: String,
    /// Tracked job ids, in job-slot order
    pub job_ids: Vec<i64>,
}

impl BuildRecord {
    /// Number of characters kept from the commit sha.
    pub const SHORT_SHA_LEN: usize = 6;

    /// Create a build record, abbreviating the sha and keeping the first
    /// `jobs_per_build` job ids.
    pub fn new(
        build_id: i64,
        commit_sha: &str,
        commit_message: String,
        job_ids: impl IntoIterator<Item = i64>,
        jobs_per_build: usize,
    ) -> Self {
        BuildRecord {
            build_id,
            short_sha: commit_sha.chars().take(Self::SHORT_SHA_LEN).collect(),
            commit_message,
            job_ids: job_ids.into_iter().take(jobs_per_build).collect(),
        }
    }
}

/// One `(test identifier, status)` pair. Serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome(pub String, pub TestStatus);

impl TestOutcome {
    pub fn new(test: impl Into<String>, status: TestStatus) -> Self {
        TestOutcome(test.into(), status)
    }

    pub fn test(&self) -> &str {
        &self.0
    }

    pub fn status(&self) -> TestStatus {
        self.1
    }
}

/// Outcomes of one job in log order. May contain the same test more than once.
pub type JobOutcomes = Vec<TestOutcome>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_record_truncates_sha_and_jobs() {
        let record = BuildRecord::new(
            42,
            "0123456789abcdef",
            "Fix things".to_string(),
            vec![1, 2, 3, 4, 5, 6],
            4,
        );
        assert_eq!(record.short_sha, "012345");
        assert_eq!(record.job_ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_build_record_wire_format() {
        let record = BuildRecord::new(7, "abc", "msg".to_string(), vec![10, 11], 4);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "build_id": 7,
                "sha": "abc",
                "commit_message": "msg",
                "job_ids": [10, 11]
            })
        );
    }

    #[test]
    fn test_job_outcomes_are_pairs() {
        let outcomes: JobOutcomes = vec![
            TestOutcome::new("ray/tests/test_a.py::test_x", TestStatus::Passed),
            TestOutcome::new("ray/tests/test_a.py::test_y", TestStatus::Failed),
        ];
        let json = serde_json::to_string(&outcomes).unwrap();
        assert_eq!(
            json,
            r#"[["ray/tests/test_a.py::test_x","PASSED"],["ray/tests/test_a.py::test_y","FAILED"]]"#
        );

        let back: JobOutcomes = serde_json::from_str(&json).unwrap();
        assert_eq!(back[1].test(), "ray/tests/test_a.py::test_y");
        assert_eq!(back[1].status(), TestStatus::Failed);
    }
}
