//! `SeaORM` entities for the fleet tables.
//!
//! Owned resources implement [`ScopableEntity`](botfleet_db::secure::ScopableEntity)
//! so every access goes through the owner-scoped ORM.

/// Implement `ScopableEntity` for an entity with `id` and `owner_id` columns.
macro_rules! owned_by_principal {
    () => {
        impl botfleet_db::secure::ScopableEntity for Entity {
            fn resource_col() -> Option<Self::Column> {
                Some(Column::Id)
            }

            fn owner_col() -> Option<Self::Column> {
                Some(Column::OwnerId)
            }
        }
    };
}

pub mod audit_log;
pub mod bot;
pub mod flow;
pub mod lead;
pub mod principal;
pub mod tracking_link;
