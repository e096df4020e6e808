//! Domain models for the CI test tracker.

pub mod build;
pub mod matrix;
pub mod test_status;

// Re-export commonly used types
pub use build::{BuildRecord, JobOutcomes, TestOutcome};
pub use matrix::{MatrixColumn, ResultMatrix};
pub use test_status::{StatusEncoding, TestStatus};
