//! In-process store used in development and tests.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::AppResult;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// A TTL too large to represent never expires.
fn deadline(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}

fn is_live(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_none_or(|at| at > now)
}

/// Store backed by hash maps behind async locks. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    sets: RwLock<HashMap<String, BTreeMap<String, Option<Instant>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| is_live(e.expires_at, now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: deadline(ttl),
            },
        );
        Ok(())
    }

    async fn add_to_set(&self, set: &str, member: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut sets = self.sets.write().await;
        sets.entry(set.to_string())
            .or_default()
            .insert(member.to_string(), deadline(ttl));
        Ok(())
    }

    async fn set_members(&self, set: &str) -> AppResult<Vec<String>> {
        let now = Instant::now();
        let sets = self.sets.read().await;
        Ok(sets
            .get(set)
            .map(|members| {
                members
                    .iter()
                    .filter(|(_, expires_at)| is_live(**expires_at, now))
                    .map(|(member, _)| member.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        let now = Instant::now();
        let mut removed = 0u64;

        {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, e| is_live(e.expires_at, now));
            removed += (before - entries.len()) as u64;
        }

        let mut sets = self.sets.write().await;
        for members in sets.values_mut() {
            let before = members.len();
            members.retain(|_, expires_at| is_live(*expires_at, now));
            removed += (before - members.len()) as u64;
        }
        sets.retain(|_, members| !members.is_empty());

        Ok(removed)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1", None).await.unwrap();
        store.set("k", "v2", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_expired_values_are_invisible() {
        let store = MemoryStore::new();
        store.set("gone", "v", Some(Duration::ZERO)).await.unwrap();
        store
            .set("kept", "v", Some(Duration::from_secs(3600)))
            .await
            .unwrap();

        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(store.get("kept").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_oversized_ttl_never_expires() {
        let store = MemoryStore::new();
        let forever = Some(Duration::from_secs(u64::MAX));
        store.set("k", "v", forever).await.unwrap();
        store.add_to_set("s", "1", forever).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.set_members("s").await.unwrap(), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_set_members_dedupe_and_expire() {
        let store = MemoryStore::new();
        store.add_to_set("s", "2", None).await.unwrap();
        store.add_to_set("s", "1", None).await.unwrap();
        store.add_to_set("s", "2", None).await.unwrap();
        store
            .add_to_set("s", "3", Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(store.set_members("s").await.unwrap(), vec!["1", "2"]);
        assert!(store.set_members("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_counts_entries_and_members() {
        let store = MemoryStore::new();
        store.set("a", "v", Some(Duration::ZERO)).await.unwrap();
        store.set("b", "v", None).await.unwrap();
        store
            .add_to_set("s", "x", Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(store.get("b").await.unwrap(), Some("v".to_string()));
    }
}
