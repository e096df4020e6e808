//! Key-value persistence used by ingestion (writes) and aggregation (reads).
//!
//! [`KeyValueStore`] is the minimal backend contract: plain keys with an
//! optional TTL plus string sets. [`TrackerStore`] layers the tracker's key
//! layout and JSON encoding on top of any backend.

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::config::DatabaseSettings;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{BuildRecord, JobOutcomes};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Key layout shared by every backend.
pub mod keys {
    /// Set of every ingested build id.
    pub const BUILD_IDS: &str = "build_ids";
    /// Human-readable time of the last completed ingestion batch.
    pub const LAST_UPDATED: &str = "last_updated";
    /// Epoch seconds of the last completed ingestion batch.
    pub const LAST_UPDATED_UNIX: &str = "last_updated_unix";

    pub fn build(build_id: i64) -> String {
        format!("build/{}", build_id)
    }

    pub fn job(job_id: i64) -> String {
        format!("job/{}", job_id)
    }
}

/// Backend operations. Expired values behave exactly like missing ones.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a value, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// Add a member to a set. Re-adding refreshes the member's TTL.
    async fn add_to_set(&self, set: &str, member: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// All live members of a set, in no particular order.
    async fn set_members(&self, set: &str) -> AppResult<Vec<String>>;

    /// Physically remove expired entries. Returns the number removed.
    async fn purge_expired(&self) -> AppResult<u64>;

    /// Cheap connectivity check.
    async fn ping(&self) -> AppResult<()>;

    /// Backend name for logs and the info endpoint.
    fn backend_name(&self) -> &'static str;
}

/// Open the configured backend: PostgreSQL (migrated) when database settings
/// are present, otherwise a fresh in-memory store.
pub async fn open(database: Option<&DatabaseSettings>) -> AppResult<TrackerStore> {
    let backend: Arc<dyn KeyValueStore> = match database {
        Some(settings) => {
            let pool = DbPool::new(settings).await?;
            pool.run_migrations().await?;
            info!("Database migrations complete");
            Arc::new(PostgresStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(TrackerStore::new(backend))
}

/// Typed access to the tracker's records.
#[derive(Clone)]
pub struct TrackerStore {
    backend: Arc<dyn KeyValueStore>,
}

/// Timestamps written after each ingestion batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastUpdated {
    pub text: Option<String>,
    pub unix: Option<i64>,
}

impl TrackerStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.backend.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw, ttl).await
    }

    /// Register a build id and write its record.
    pub async fn put_build(&self, record: &BuildRecord, ttl: Option<Duration>) -> AppResult<()> {
        self.backend
            .add_to_set(keys::BUILD_IDS, &record.build_id.to_string(), ttl)
            .await?;
        self.set_json(&keys::build(record.build_id), record, ttl)
            .await
    }

    /// Read a build record. `None` if it expired or was never written.
    pub async fn get_build(&self, build_id: i64) -> AppResult<Option<BuildRecord>> {
        self.get_json(&keys::build(build_id)).await
    }

    pub async fn put_job_outcomes(
        &self,
        job_id: i64,
        outcomes: &JobOutcomes,
        ttl: Option<Duration>,
    ) -> AppResult<()> {
        self.set_json(&keys::job(job_id), outcomes, ttl).await
    }

    /// Read a job's outcomes. `None` if not (yet) written or expired.
    pub async fn get_job_outcomes(&self, job_id: i64) -> AppResult<Option<JobOutcomes>> {
        self.get_json(&keys::job(job_id)).await
    }

    /// Every known build id. Members that are not integers are skipped.
    pub async fn known_build_ids(&self) -> AppResult<Vec<i64>> {
        let members = self.backend.set_members(keys::BUILD_IDS).await?;
        Ok(members
            .into_iter()
            .filter_map(|m| match m.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("Ignoring malformed build id in {}: {:?}", keys::BUILD_IDS, m);
                    None
                }
            })
            .collect())
    }

    pub async fn record_last_updated(&self, at: DateTime<Utc>) -> AppResult<()> {
        self.backend
            .set(keys::LAST_UPDATED, &at.to_rfc3339(), None)
            .await?;
        self.backend
            .set(keys::LAST_UPDATED_UNIX, &at.timestamp().to_string(), None)
            .await
    }

    pub async fn last_updated(&self) -> AppResult<LastUpdated> {
        let text = self.backend.get(keys::LAST_UPDATED).await?;
        let unix = self
            .backend
            .get(keys::LAST_UPDATED_UNIX)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        Ok(LastUpdated { text, unix })
    }
}
