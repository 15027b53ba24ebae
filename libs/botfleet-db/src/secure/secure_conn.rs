//! `SecureConn`: the only road from application code to owned resources.
//!
//! Every read is owner-filtered, every insert has its owner forced, and every
//! update or delete carries the owner predicate in the same statement as the
//! id predicate.
//!
//! ```ignore
//! let scope = AccessScope::owned_by(&ctx);
//! let bots = db.find::<bot::Entity>(&scope)
//!     .order_by(bot::Column::Id, Order::Asc)
//!     .all(db.conn())
//!     .await?;
//! ```

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};

use botfleet_security::{AccessScope, SecurityContext};

use crate::secure::db_ops::{
    SecureDeleteExt, SecureDeleteMany, SecureUpdateExt, SecureUpdateMany, secure_insert,
};
use crate::secure::{ScopableEntity, ScopeError, Scoped, SecureEntityExt, SecureSelect};

/// Secure database connection wrapper.
///
/// Cloning is cheap; all clones share the pool.
#[derive(Clone, Debug)]
pub struct SecureConn {
    conn: DatabaseConnection,
}

impl SecureConn {
    /// Typically created via `DbHandle::sea_secure()` rather than directly.
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Connection for executing already-scoped builders (`.one()`, `.all()`, `.exec()`).
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Scoped read-many.
    #[allow(clippy::unused_self)] // Keep fluent &SecureConn API even when method only delegates
    pub fn find<E>(&self, scope: &AccessScope) -> SecureSelect<E, Scoped>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        E::find().secure().scope_with(scope)
    }

    /// Scoped read-one.
    ///
    /// # Errors
    /// Returns `ScopeError::Invalid` if the entity doesn't have a resource column.
    pub fn find_by_id<E>(
        &self,
        scope: &AccessScope,
        id: i64,
    ) -> Result<SecureSelect<E, Scoped>, ScopeError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        self.find::<E>(scope).and_id(id)
    }

    /// Number of rows visible through `scope`.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the query fails.
    pub async fn count<E>(&self, scope: &AccessScope) -> Result<u64, ScopeError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
        E::Model: sea_orm::FromQueryResult + Send + Sync,
    {
        self.find::<E>(scope).count(&self.conn).await
    }

    /// Scoped bulk update. Chain `.col_expr(..)` before `.exec(..)`.
    #[allow(clippy::unused_self)]
    pub fn update_many<E>(&self, scope: &AccessScope) -> SecureUpdateMany<E, Scoped>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        E::update_many().secure().scope_with(scope)
    }

    /// Scoped bulk delete.
    #[allow(clippy::unused_self)]
    pub fn delete_many<E>(&self, scope: &AccessScope) -> SecureDeleteMany<E, Scoped>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        E::delete_many().secure().scope_with(scope)
    }

    /// Insert a resource owned by the context's principal.
    ///
    /// # Errors
    /// - `ScopeError::Denied` if the principal is deactivated.
    /// - `ScopeError::Invalid` if the entity has no owner column.
    /// - `ScopeError::Db` if the insert fails.
    pub async fn insert<E>(
        &self,
        ctx: &SecurityContext,
        am: E::ActiveModel,
    ) -> Result<E::Model, ScopeError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
        E::Model: sea_orm::IntoActiveModel<E::ActiveModel>,
    {
        if !ctx.principal().is_active {
            return Err(ScopeError::Denied("principal is deactivated"));
        }
        secure_insert::<E>(am, ctx.principal_id(), &self.conn).await
    }

    /// Update one resource in a single statement guarded by id and owner.
    ///
    /// Owner and id columns in `am` are ignored. Returns the row as stored
    /// after the update.
    ///
    /// # Errors
    /// - `ScopeError::NotFound` when no row matches both the id and the scope.
    /// - `ScopeError::Invalid` if the entity has no resource column.
    /// - `ScopeError::Db` if the statement fails.
    pub async fn update_by_id<E>(
        &self,
        scope: &AccessScope,
        id: i64,
        mut am: E::ActiveModel,
    ) -> Result<E::Model, ScopeError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    {
        let resource_col = E::resource_col().ok_or(ScopeError::Invalid(
            "Entity must have a resource_col to use update_by_id()",
        ))?;
        am.not_set(resource_col);
        if let Some(owner_col) = E::owner_col() {
            am.not_set(owner_col);
        }

        if am.is_changed() {
            let result = E::update_many()
                .set(am)
                .filter(Expr::col(resource_col).eq(id))
                .secure()
                .scope_with(scope)
                .exec(&self.conn)
                .await?;
            if result.rows_affected == 0 {
                return Err(ScopeError::NotFound);
            }
        }

        self.find_by_id::<E>(scope, id)?
            .one(&self.conn)
            .await?
            .ok_or(ScopeError::NotFound)
    }

    /// Delete one resource in a single statement guarded by id and owner.
    ///
    /// # Errors
    /// - `ScopeError::NotFound` when no row matches both the id and the scope.
    /// - `ScopeError::Invalid` if the entity has no resource column.
    /// - `ScopeError::Db` if the statement fails.
    pub async fn delete_by_id<E>(&self, scope: &AccessScope, id: i64) -> Result<(), ScopeError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        let resource_col = E::resource_col().ok_or(ScopeError::Invalid(
            "Entity must have a resource_col to use delete_by_id()",
        ))?;
        let result = self
            .delete_many::<E>(scope)
            .filter(sea_orm::Condition::all().add(Expr::col(resource_col).eq(id)))
            .exec(&self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ScopeError::NotFound);
        }
        Ok(())
    }
}
