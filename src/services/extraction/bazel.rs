//! Bazel test summary lines.
//!
//! ```text
//! //python/ray/tests:test_basic                      PASSED in 31.4s
//! //python/ray/tests:test_actor             (cached) FLAKY, failed in 1 out of 2 in 60.1s
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::models::TestStatus;

/// Longer tokens first so `FAILED` never shadows `FAILED_TO_BUILD`.
static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^//(\S+)[ \t]+(?:\(cached\)[ \t]+)?(BLAZE_HALTED_BEFORE_TESTING|FAILED_TO_BUILD|REMOTE_FAILURE|INCOMPLETE|NO_STATUS|TIMEOUT|PASSED|FAILED|FLAKY)\b[^\n]*$",
    )
    .expect("bazel status pattern is valid")
});

pub(super) fn pattern() -> &'static Regex {
    &STATUS_LINE
}

/// Bazel's nine test statuses collapsed onto the canonical four.
///
/// `FLAKY` passed on retry. Statuses where the test never ran to completion
/// count as skipped; the rest are failures.
pub(super) fn canonicalize(token: &str) -> TestStatus {
    match token {
        "PASSED" | "FLAKY" => TestStatus::Passed,
        "FAILED" | "TIMEOUT" | "REMOTE_FAILURE" | "FAILED_TO_BUILD" => TestStatus::Failed,
        "NO_STATUS" | "INCOMPLETE" | "BLAZE_HALTED_BEFORE_TESTING" => TestStatus::Skipped,
        _ => TestStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_summary_lines() {
        let caps = pattern()
            .captures("//python/ray/tests:test_basic      PASSED in 31.4s")
            .unwrap();
        assert_eq!(&caps[1], "python/ray/tests:test_basic");
        assert_eq!(&caps[2], "PASSED");

        let caps = pattern()
            .captures("//python/ray/tests:test_actor   (cached) FLAKY, failed in 1 out of 2")
            .unwrap();
        assert_eq!(&caps[2], "FLAKY");
    }

    #[test]
    fn test_prefers_longest_status() {
        let caps = pattern()
            .captures("//python/ray/tests:test_build FAILED_TO_BUILD")
            .unwrap();
        assert_eq!(&caps[2], "FAILED_TO_BUILD");
    }

    #[test]
    fn test_requires_double_slash_prefix() {
        assert!(pattern().captures("python/ray/tests:test_basic PASSED").is_none());
        assert!(pattern().captures("  //python/ray/tests:test_basic PASSED").is_none());
    }

    #[test]
    fn test_every_bazel_status_is_mapped() {
        let statuses = [
            "NO_STATUS",
            "PASSED",
            "FLAKY",
            "TIMEOUT",
            "FAILED",
            "INCOMPLETE",
            "REMOTE_FAILURE",
            "FAILED_TO_BUILD",
            "BLAZE_HALTED_BEFORE_TESTING",
        ];
        for status in statuses {
            assert_ne!(canonicalize(status), TestStatus::Unknown, "{status}");
        }
        assert_eq!(canonicalize("ERROR"), TestStatus::Unknown);
    }
}
