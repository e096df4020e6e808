//! Migration: Create kv_set_members table.
//!
//! One row per set member; used for the set of known build ids.

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
                CREATE TABLE kv_set_members (
                    set_key VARCHAR(255) NOT NULL,
                    member VARCHAR(255) NOT NULL,
                    expires_at TIMESTAMPTZ,
                    PRIMARY KEY (set_key, member)
                );

                CREATE INDEX idx_kv_set_members_expires_at ON kv_set_members(expires_at)
                    WHERE expires_at IS NOT NULL;
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS kv_set_members;")
            .await?;

        Ok(())
    }
}
