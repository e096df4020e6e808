//! Migration: Create kv_entries table.
//!
//! Holds build records, per-job outcome lists and last-updated scalars.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE kv_entries (
                    key VARCHAR(255) PRIMARY KEY, -- e.g. build/<id>, job/<id>
                    value TEXT NOT NULL,          -- JSON or plain text

                    -- NULL = no retention limit
                    expires_at TIMESTAMPTZ,

                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Index for the periodic purge of expired rows
                CREATE INDEX idx_kv_entries_expires_at ON kv_entries(expires_at)
                    WHERE expires_at IS NOT NULL;
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS kv_entries;")
            .await?;

        Ok(())
    }
}
