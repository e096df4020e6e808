//! CI test tracker library.
//!
//! Extracts per-test outcomes from CI job logs, stores them per build and job,
//! and aggregates them into a ranked test-by-build matrix for the dashboard.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod store;
