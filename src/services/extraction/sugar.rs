//! pytest-sugar compact report lines.
//!
//! ```text
//!  ray.tests.test_basic::test_submit ✓                              12% █▎
//! ```
//!
//! Identifiers come out as dotted module paths and are rewritten so the
//! package segment is separated like a pytest node id.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::TestStatus;

/// Package segment every identifier must start with.
const PACKAGE_PREFIX: &str = "ray.";

static SUGAR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:python/)?((?:\w+\.)*test\w*::\S+)[ \t]+(✓|⨯|s)(?:[ \t][^\n]*)?\r?$")
        .expect("pytest-sugar pattern is valid")
});

pub(super) fn pattern() -> &'static Regex {
    &SUGAR_LINE
}

pub(super) fn canonicalize(token: &str) -> TestStatus {
    match token {
        "✓" => TestStatus::Passed,
        "⨯" => TestStatus::Failed,
        "s" => TestStatus::Skipped,
        _ => TestStatus::Unknown,
    }
}

/// Prepend the package segment if missing, then turn only the first `.` into
/// `::`. Later dots belong to module or file names and are kept.
pub(super) fn canonical_identifier(raw: &str) -> String {
    if raw.starts_with(PACKAGE_PREFIX) {
        raw.replacen('.', "::", 1)
    } else {
        format!("{PACKAGE_PREFIX}{raw}").replacen('.', "::", 1)
    }
}
