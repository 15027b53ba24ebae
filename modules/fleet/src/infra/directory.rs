//! Principal lookups over the `users` table.

use async_trait::async_trait;
use botfleet_auth::{DirectoryError, PrincipalDirectory};
use botfleet_security::{Principal, PrincipalId};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::infra::storage::entity::principal;

/// `users` is not an owned resource, so lookups use the raw connection.
#[derive(Clone, Debug)]
pub struct SeaOrmPrincipalDirectory {
    conn: DatabaseConnection,
}

impl SeaOrmPrincipalDirectory {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl PrincipalDirectory for SeaOrmPrincipalDirectory {
    async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, DirectoryError> {
        principal::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .map(|found| found.map(Principal::from))
            .map_err(|e| {
                tracing::error!(error = %e, principal_id = id, "principal lookup failed");
                DirectoryError::new(e.to_string())
            })
    }
}
