//! Database queries for key-value entries and set members.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::kv_entry::{self, Entity as KvEntry};
use crate::entity::kv_set_member::{self, Entity as KvSetMember};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Get a live (non-expired) value.
    pub async fn get_entry(&self, key: &str) -> AppResult<Option<String>> {
        let now = Utc::now();
        let entry = KvEntry::find_by_id(key.to_string())
            .filter(
                Condition::any()
                    .add(kv_entry::Column::ExpiresAt.is_null())
                    .add(kv_entry::Column::ExpiresAt.gt(now)),
            )
            .one(self.connection())
            .await
            .map_err(|e| AppError::Store(format!("Failed to read key '{}': {}", key, e)))?;

        Ok(entry.map(|e| e.value))
    }

    /// Insert or replace a value together with its expiry.
    pub async fn upsert_entry(
        &self,
        key: &str,
        value: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let model = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            expires_at: Set(expires_at),
            updated_at: Set(Utc::now()),
        };

        KvEntry::insert(model)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([
                        kv_entry::Column::Value,
                        kv_entry::Column::ExpiresAt,
                        kv_entry::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Store(format!("Failed to write key '{}': {}", key, e)))?;

        Ok(())
    }

    /// Add a set member, refreshing its expiry if already present.
    pub async fn upsert_set_member(
        &self,
        set_key: &str,
        member: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let model = kv_set_member::ActiveModel {
            set_key: Set(set_key.to_string()),
            member: Set(member.to_string()),
            expires_at: Set(expires_at),
        };

        KvSetMember::insert(model)
            .on_conflict(
                OnConflict::columns([kv_set_member::Column::SetKey, kv_set_member::Column::Member])
                    .update_column(kv_set_member::Column::ExpiresAt)
                    .to_owned(),
            )
            .exec(self.connection())
            .await
            .map_err(|e| {
                AppError::Store(format!("Failed to add '{}' to set '{}': {}", member, set_key, e))
            })?;

        Ok(())
    }

    /// List live members of a set.
    pub async fn list_set_members(&self, set_key: &str) -> AppResult<Vec<String>> {
        let now = Utc::now();
        let members = KvSetMember::find()
            .filter(kv_set_member::Column::SetKey.eq(set_key))
            .filter(
                Condition::any()
                    .add(kv_set_member::Column::ExpiresAt.is_null())
                    .add(kv_set_member::Column::ExpiresAt.gt(now)),
            )
            .order_by_asc(kv_set_member::Column::Member)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Store(format!("Failed to scan set '{}': {}", set_key, e)))?;

        Ok(members.into_iter().map(|m| m.member).collect())
    }

    /// Delete every expired entry and set member.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let now = Utc::now();

        let entries = KvEntry::delete_many()
            .filter(kv_entry::Column::ExpiresAt.lte(now))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Store(format!("Failed to purge expired entries: {}", e)))?;

        let members = KvSetMember::delete_many()
            .filter(kv_set_member::Column::ExpiresAt.lte(now))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Store(format!("Failed to purge expired set members: {}", e)))?;

        Ok(entries.rows_affected + members.rows_affected)
    }

    /// Verify the database answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.connection()
            .ping()
            .await
            .map_err(|e| AppError::Store(format!("Database ping failed: {}", e)))
    }
}
