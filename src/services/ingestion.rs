//! Ingestion batches: CI builds and job logs into the tracker store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{BuildRecord, JobOutcomes};
use crate::services::ci_client::CiProvider;
use crate::services::extraction;
use crate::store::TrackerStore;

/// Knobs for one ingestion batch.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub branch: String,
    pub event_type: String,
    pub jobs_per_build: usize,
    pub retention: Duration,
    pub max_concurrent_fetches: usize,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        IngestSettings {
            branch: config.ci.branch.clone(),
            event_type: config.ci.event_type.clone(),
            jobs_per_build: config.tracker.jobs_per_build,
            retention: config.tracker.retention(),
            max_concurrent_fetches: config.tracker.max_concurrent_fetches,
        }
    }
}

/// Counters for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub builds: usize,
    pub jobs: usize,
    /// Jobs whose log produced at least one outcome
    pub jobs_with_outcomes: usize,
    /// Jobs whose log could not be fetched or was unusable
    pub failed_fetches: usize,
    pub outcomes: usize,
}

/// What happened to one job.
enum JobResult {
    Parsed(usize),
    Unavailable,
}

/// Pulls recent builds from a [`CiProvider`] and writes their records.
#[derive(Clone)]
pub struct Ingestor {
    provider: Arc<dyn CiProvider>,
    store: TrackerStore,
    settings: IngestSettings,
}

impl Ingestor {
    pub fn new(provider: Arc<dyn CiProvider>, store: TrackerStore, settings: IngestSettings) -> Self {
        Self {
            provider,
            store,
            settings,
        }
    }

    /// Ingest the `limit` most recent builds, newest first.
    ///
    /// A job whose log is unavailable is stored with no outcomes. Failing to
    /// list builds or to write the store fails the whole batch.
    pub async fn ingest(&self, limit: usize) -> AppResult<IngestSummary> {
        let builds = self
            .provider
            .list_recent_builds(&self.settings.branch, &self.settings.event_type, limit)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        info!(
            "Ingesting {} builds (branch={}, limit={})",
            builds.len(),
            self.settings.branch,
            limit
        );

        let ttl = Some(self.settings.retention);
        let mut summary = IngestSummary::default();

        // Build records first, then every job of the batch shares one fetch pool
        let mut job_ids = Vec::new();
        for build in &builds {
            let record = BuildRecord::new(
                build.id,
                &build.commit.sha,
                build.commit.message.clone(),
                build.job_ids(),
                self.settings.jobs_per_build,
            );
            self.store.put_build(&record, ttl).await?;
            summary.builds += 1;
            debug!(
                build_id = record.build_id,
                sha = %record.short_sha,
                jobs = record.job_ids.len(),
                "Build recorded"
            );
            job_ids.extend(record.job_ids);
        }

        let results: Vec<AppResult<JobResult>> = stream::iter(job_ids)
            .map(|job_id| self.ingest_job(job_id, ttl))
            .buffer_unordered(self.settings.max_concurrent_fetches.max(1))
            .collect()
            .await;

        for result in results {
            summary.jobs += 1;
            match result? {
                JobResult::Parsed(0) => {}
                JobResult::Parsed(n) => {
                    summary.jobs_with_outcomes += 1;
                    summary.outcomes += n;
                }
                JobResult::Unavailable => summary.failed_fetches += 1,
            }
        }

        self.store.record_last_updated(Utc::now()).await?;

        info!(
            builds = summary.builds,
            jobs = summary.jobs,
            jobs_with_outcomes = summary.jobs_with_outcomes,
            failed_fetches = summary.failed_fetches,
            outcomes = summary.outcomes,
            "Ingestion batch complete"
        );

        Ok(summary)
    }

    /// Fetch, parse and store one job log.
    async fn ingest_job(&self, job_id: i64, ttl: Option<Duration>) -> AppResult<JobResult> {
        let (outcomes, result) = match self.provider.fetch_job_log(job_id).await {
            Ok(raw) if extraction::is_usable_log(&raw) => {
                let parsed = extraction::parse_log(&raw);
                if let Some(dialect) = parsed.dialect {
                    debug!(job_id, %dialect, outcomes = parsed.outcomes.len(), "Job log parsed");
                }
                let n = parsed.outcomes.len();
                (parsed.outcomes, JobResult::Parsed(n))
            }
            Ok(raw) => {
                warn!(job_id, bytes = raw.len(), "Job log missing or truncated");
                (JobOutcomes::new(), JobResult::Unavailable)
            }
            Err(e) => {
                warn!(job_id, "Failed to fetch job log: {}", e);
                (JobOutcomes::new(), JobResult::Unavailable)
            }
        };

        self.store.put_job_outcomes(job_id, &outcomes, ttl).await?;
        Ok(result)
    }
}
