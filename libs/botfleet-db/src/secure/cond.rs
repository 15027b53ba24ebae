use sea_orm::{ColumnTrait, Condition, EntityTrait, sea_query::Expr};

use crate::secure::{AccessScope, ScopableEntity};

/// Builds the `SeaORM` `Condition` for an owner scope.
///
/// | Scope | Condition |
/// |-------|-----------|
/// | empty | `WHERE false` |
/// | owners, entity has `owner_col` | `owner_col IN (..)` |
/// | owners, entity has no `owner_col` | `WHERE false` |
/// | unrestricted | no predicate |
#[must_use]
pub fn build_scope_condition<E>(scope: &AccessScope) -> Condition
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    let deny_all = || Condition::all().add(Expr::value(false));

    if scope.is_unrestricted() {
        return Condition::all();
    }
    if scope.is_empty() {
        return deny_all();
    }

    match E::owner_col() {
        Some(owner_col) => {
            Condition::all().add(Expr::col(owner_col).is_in(scope.owner_ids().to_vec()))
        }
        None => deny_all(),
    }
}
