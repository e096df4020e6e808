//! Canonical test status shared by extraction, storage and aggregation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical outcome of a single test in a single job.
///
/// `Unknown` covers both unrecognized status tokens in a log and cells with no
/// recorded outcome at aggregation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Unknown,
}

impl TestStatus {
    /// All statuses in encoding order.
    pub const ALL: [TestStatus; 4] = [Self::Passed, Self::Failed, Self::Skipped, Self::Unknown];

    /// Convert to the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse from the stored string representation. Never fails.
    pub fn parse(s: &str) -> Self {
        match s {
            "PASSED" => Self::Passed,
            "FAILED" => Self::Failed,
            "SKIPPED" => Self::Skipped,
            _ => Self::Unknown,
        }
    }

    /// Small-integer encoding used in the result matrix.
    pub fn code(&self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
            Self::Skipped => 2,
            Self::Unknown => 3,
        }
    }

    /// Contribution of one cell to a test's instability score.
    ///
    /// Failures dominate; a missing result is a weak signal that still ranks
    /// above a clean pass.
    pub fn instability_weight(&self) -> f64 {
        match self {
            Self::Failed => 10.0,
            Self::Unknown => 0.1,
            Self::Skipped | Self::Passed => 0.0,
        }
    }
}

impl From<String> for TestStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status-to-integer table attached to every matrix response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub struct StatusEncoding {
    pub passed: u8,
    pub failed: u8,
    pub skipped: u8,
    pub unknown: u8,
}

impl Default for StatusEncoding {
    fn default() -> Self {
        StatusEncoding {
            passed: TestStatus::Passed.code(),
            failed: TestStatus::Failed.code(),
            skipped: TestStatus::Skipped.code(),
            unknown: TestStatus::Unknown.code(),
        }
    }
}
