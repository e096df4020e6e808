//! Pipeline test suite.
//!
//! Drives ingestion and aggregation end-to-end against a scripted CI provider
//! and the in-memory store. No network or database required.
//!
//! Run with: cargo test --test pipeline

mod test_helpers;

mod test_dashboard_http;
mod test_end_to_end;
