//! PostgreSQL-backed store built on the SeaORM pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::KeyValueStore;
use crate::db::DbPool;
use crate::error::AppResult;

/// Store persisting entries in the `kv_entries` and `kv_set_members` tables.
///
/// Expiry is enforced on read; rows are physically removed by
/// [`KeyValueStore::purge_expired`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: DbPool,
}

impl PostgresStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// A TTL past the representable date range never expires.
fn expires_at(ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok())
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.pool.get_entry(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        self.pool.upsert_entry(key, value, expires_at(ttl)).await
    }

    async fn add_to_set(&self, set: &str, member: &str, ttl: Option<Duration>) -> AppResult<()> {
        self.pool
            .upsert_set_member(set, member, expires_at(ttl))
            .await
    }

    async fn set_members(&self, set: &str) -> AppResult<Vec<String>> {
        self.pool.list_set_members(set).await
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        self.pool.delete_expired().await
    }

    async fn ping(&self) -> AppResult<()> {
        self.pool.ping().await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_at_none_without_ttl() {
        assert_eq!(expires_at(None), None);
    }

    #[test]
    fn test_expires_at_in_the_future() {
        let before = Utc::now();
        let at = expires_at(Some(Duration::from_secs(60))).unwrap();
        assert!(at > before);
        assert!(at <= Utc::now() + chrono::Duration::seconds(60));
    }

    #[test]
    fn test_expires_at_out_of_range_never_expires() {
        assert_eq!(expires_at(Some(Duration::from_secs(u64::MAX))), None);
        assert_eq!(expires_at(Some(Duration::from_secs(10_000_000_000_000))), None);
    }
}
