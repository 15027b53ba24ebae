use botfleet_security::Principal;
use sea_orm::entity::prelude::*;

/// Registered principals. Written by the external registration flow; the core
/// only reads them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Principal {
    fn from(m: Model) -> Self {
        Principal::new(m.id, m.username, m.email)
            .with_active(m.is_active)
            .with_superuser(m.is_superuser)
    }
}
