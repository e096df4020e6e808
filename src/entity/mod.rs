//! SeaORM entities.

pub mod kv_entry;
pub mod kv_set_member;
