use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use std::marker::PhantomData;

use botfleet_security::PrincipalId;

use crate::secure::cond::build_scope_condition;
use crate::secure::error::ScopeError;
use crate::secure::{AccessScope, ScopableEntity, Scoped, Unscoped};

/// Insert `am` with its owner column forced to `owner`.
///
/// Whatever the caller put into the owner column is overwritten, so a request
/// can never create a resource on someone else's behalf.
///
/// # Errors
/// - `ScopeError::Invalid` if the entity has no owner column.
/// - `ScopeError::Db` if the insert fails.
pub async fn secure_insert<E>(
    mut am: E::ActiveModel,
    owner: PrincipalId,
    conn: &impl ConnectionTrait,
) -> Result<E::Model, ScopeError>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: sea_orm::IntoActiveModel<E::ActiveModel>,
{
    let owner_col = E::owner_col().ok_or(ScopeError::Invalid(
        "Entity must have an owner_col to be inserted through the guard",
    ))?;
    am.set(owner_col, owner.into());
    if let Some(resource_col) = E::resource_col()
        && matches!(am.get(resource_col), ActiveValue::Set(_))
    {
        // Ids are assigned by the store.
        am.not_set(resource_col);
    }
    Ok(am.insert(conn).await?)
}

/// A `SeaORM` `UpdateMany` that cannot run until an owner scope is applied.
///
/// ```rust,ignore
/// let result = bot::Entity::update_many()
///     .col_expr(bot::Column::IsActive, Expr::value(false))
///     .secure()
///     .scope_with(&AccessScope::owned_by(&ctx))
///     .exec(conn)
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct SecureUpdateMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::UpdateMany<E>,
    pub(crate) _state: PhantomData<S>,
}

pub trait SecureUpdateExt<E: EntityTrait>: Sized {
    /// You must call `.scope_with()` before executing.
    fn secure(self) -> SecureUpdateMany<E, Unscoped>;
}

impl<E> SecureUpdateExt<E> for sea_orm::UpdateMany<E>
where
    E: EntityTrait,
{
    fn secure(self) -> SecureUpdateMany<E, Unscoped> {
        SecureUpdateMany {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> SecureUpdateMany<E, Unscoped>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    /// An empty scope updates nothing.
    #[must_use]
    pub fn scope_with(self, scope: &AccessScope) -> SecureUpdateMany<E, Scoped> {
        let cond = build_scope_condition::<E>(scope);
        SecureUpdateMany {
            inner: self.inner.filter(cond),
            _state: PhantomData,
        }
    }
}

impl<E> SecureUpdateMany<E, Scoped>
where
    E: EntityTrait,
{
    #[must_use]
    pub fn col_expr<T>(mut self, col: T, expr: sea_orm::sea_query::SimpleExpr) -> Self
    where
        T: sea_orm::sea_query::IntoIden,
    {
        self.inner = self.inner.col_expr(col, expr);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: sea_orm::Condition) -> Self {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    /// # Errors
    /// Returns `ScopeError::Db` if the database operation fails.
    pub async fn exec<C: ConnectionTrait + Send + Sync>(
        self,
        conn: &C,
    ) -> Result<sea_orm::UpdateResult, ScopeError> {
        Ok(self.inner.exec(conn).await?)
    }
}

/// A `SeaORM` `DeleteMany` that cannot run until an owner scope is applied.
#[derive(Clone, Debug)]
pub struct SecureDeleteMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::DeleteMany<E>,
    pub(crate) _state: PhantomData<S>,
}

pub trait SecureDeleteExt<E: EntityTrait>: Sized {
    /// You must call `.scope_with()` before executing.
    fn secure(self) -> SecureDeleteMany<E, Unscoped>;
}

impl<E> SecureDeleteExt<E> for sea_orm::DeleteMany<E>
where
    E: EntityTrait,
{
    fn secure(self) -> SecureDeleteMany<E, Unscoped> {
        SecureDeleteMany {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> SecureDeleteMany<E, Unscoped>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    /// An empty scope deletes nothing.
    #[must_use]
    pub fn scope_with(self, scope: &AccessScope) -> SecureDeleteMany<E, Scoped> {
        let cond = build_scope_condition::<E>(scope);
        SecureDeleteMany {
            inner: self.inner.filter(cond),
            _state: PhantomData,
        }
    }
}

impl<E> SecureDeleteMany<E, Scoped>
where
    E: EntityTrait,
{
    #[must_use]
    pub fn filter(mut self, filter: sea_orm::Condition) -> Self {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    /// # Errors
    /// Returns `ScopeError::Db` if the database operation fails.
    pub async fn exec<C: ConnectionTrait + Send + Sync>(
        self,
        conn: &C,
    ) -> Result<sea_orm::DeleteResult, ScopeError> {
        Ok(self.inner.exec(conn).await?)
    }
}
