//! Business logic services.

pub mod aggregation;
pub mod ci_client;
pub mod extraction;
pub mod ingestion;
pub mod scheduler;

pub use aggregation::Aggregator;
pub use ci_client::{CiProvider, TravisClient};
pub use ingestion::{IngestSettings, IngestSummary, Ingestor};
pub use scheduler::{SchedulerConfig, start_scheduler};
