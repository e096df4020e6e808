//! Test outcome extraction from raw CI job logs.
//!
//! A log goes through three steps:
//! 1. [`ansi::normalize`] strips terminal escape sequences.
//! 2. [`extract`] matches one [`Dialect`]'s line pattern and yields raw
//!    `(identifier, status token)` pairs.
//! 3. [`Dialect::canonicalize`] and [`Dialect::canonical_identifier`] map those
//!    onto [`TestStatus`] and a stable test identifier.
//!
//! [`parse_log`] runs all three, trying dialects in [`Dialect::PRIORITY`] order.

pub mod ansi;
mod bazel;
mod pytest;
mod sugar;

use regex::Regex;

use crate::models::{JobOutcomes, TestOutcome, TestStatus};

/// Logs shorter than this are treated as truncated or unavailable.
pub const MIN_LOG_LEN: usize = 100;

/// Body returned by the CI API for jobs without a stored log.
pub const NULL_LOG: &str = "null";

/// A log format produced by one generation of the CI setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Verbose pytest: `python/ray/tests/test_x.py::test_y PASSED`
    Pytest,
    /// pytest-sugar: `ray.tests.test_x::test_y ✓`
    Sugar,
    /// Bazel summary: `//python/ray/tests:test_x PASSED in 3.1s`
    Bazel,
}

impl Dialect {
    /// Order in which dialects are tried when the producer is not known.
    pub const PRIORITY: [Dialect; 3] = [Self::Pytest, Self::Sugar, Self::Bazel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pytest => "pytest",
            Self::Sugar => "pytest-sugar",
            Self::Bazel => "bazel",
        }
    }

    /// Line pattern; capture 1 is the identifier, capture 2 the status token.
    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Pytest => pytest::pattern(),
            Self::Sugar => sugar::pattern(),
            Self::Bazel => bazel::pattern(),
        }
    }

    /// Map a raw status token to a canonical status. Unrecognized tokens
    /// become [`TestStatus::Unknown`].
    pub fn canonicalize(&self, token: &str) -> TestStatus {
        match self {
            Self::Pytest => pytest::canonicalize(token),
            Self::Sugar => sugar::canonicalize(token),
            Self::Bazel => bazel::canonicalize(token),
        }
    }

    /// Rewrite a raw identifier into its stored form.
    pub fn canonical_identifier(&self, raw: &str) -> String {
        match self {
            Self::Sugar => sugar::canonical_identifier(raw),
            Self::Pytest | Self::Bazel => raw.to_string(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A matched line before canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOutcome<'t> {
    pub identifier: &'t str,
    pub token: &'t str,
}

/// Whether a raw log body is worth matching at all.
///
/// Length is measured on the body as fetched, before escape sequences are
/// stripped.
pub fn is_usable_log(body: &[u8]) -> bool {
    body.len() >= MIN_LOG_LEN && body.trim_ascii() != NULL_LOG.as_bytes()
}

fn match_lines(text: &str, dialect: Dialect) -> impl Iterator<Item = RawOutcome<'_>> + '_ {
    dialect
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            Some(RawOutcome {
                identifier: caps.get(1)?.as_str(),
                token: caps.get(2)?.as_str(),
            })
        })
}

/// Lazily yield the raw outcomes of one dialect, in line order.
///
/// Unusable logs yield nothing.
pub fn extract(text: &str, dialect: Dialect) -> impl Iterator<Item = RawOutcome<'_>> + '_ {
    let haystack = if is_usable_log(text.as_bytes()) { text } else { "" };
    match_lines(haystack, dialect)
}

fn canonical_outcomes(text: &str, dialect: Dialect) -> JobOutcomes {
    match_lines(text, dialect)
        .map(|raw| {
            TestOutcome::new(
                dialect.canonical_identifier(raw.identifier),
                dialect.canonicalize(raw.token),
            )
        })
        .collect()
}

/// Extract and canonicalize the outcomes of one dialect.
pub fn parse_outcomes(text: &str, dialect: Dialect) -> JobOutcomes {
    if !is_usable_log(text.as_bytes()) {
        return JobOutcomes::new();
    }
    canonical_outcomes(text, dialect)
}

/// Outcomes parsed from a job log, with the dialect that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLog {
    pub dialect: Option<Dialect>,
    pub outcomes: JobOutcomes,
}

fn first_dialect_match(text: &str) -> ParsedLog {
    for dialect in Dialect::PRIORITY {
        let outcomes = canonical_outcomes(text, dialect);
        if !outcomes.is_empty() {
            return ParsedLog {
                dialect: Some(dialect),
                outcomes,
            };
        }
    }
    ParsedLog::default()
}

/// Parse already-normalized text, keeping the first dialect that matches.
pub fn extract_any(text: &str) -> ParsedLog {
    if !is_usable_log(text.as_bytes()) {
        return ParsedLog::default();
    }
    first_dialect_match(text)
}

/// Full pipeline for a raw log body: usability check on the raw bytes,
/// normalize, then match dialects in priority order.
pub fn parse_log(raw: &[u8]) -> ParsedLog {
    if !is_usable_log(raw) {
        return ParsedLog::default();
    }
    first_dialect_match(&ansi::normalize(raw))
}
