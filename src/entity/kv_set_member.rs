//! Set membership entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "kv_set_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub set_key: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member: String,
    /// NULL = never expires
    pub expires_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
