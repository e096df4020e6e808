//! Verbose pytest report lines.
//!
//! ```text
//! python/ray/tests/test_basic.py::test_submit PASSED                   [ 12%]
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::models::TestStatus;

/// The `python/` checkout prefix is dropped from identifiers; `ray/tests/` is kept.
/// Parametrized ids may contain spaces, so the identifier ends at the first
/// status word.
static REPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:python/)?(ray/tests/\S*::\S[^\n]*?)[ \t]+(PASSED|FAILED|SKIPPED)\b[^\n]*$")
        .expect("pytest report pattern is valid")
});

pub(super) fn pattern() -> &'static Regex {
    &REPORT_LINE
}

pub(super) fn canonicalize(token: &str) -> TestStatus {
    match token {
        "PASSED" => TestStatus::Passed,
        "FAILED" => TestStatus::Failed,
        "SKIPPED" => TestStatus::Skipped,
        _ => TestStatus::Unknown,
    }
}
