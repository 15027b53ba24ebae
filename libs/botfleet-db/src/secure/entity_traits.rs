use sea_orm::EntityTrait;

/// Entities that take part in owner scoping.
///
/// Both columns must be declared explicitly; there are no defaults.
///
/// ```rust,ignore
/// impl ScopableEntity for bot::Entity {
///     fn resource_col() -> Option<Self::Column> {
///         Some(bot::Column::Id)
///     }
///     fn owner_col() -> Option<Self::Column> {
///         Some(bot::Column::OwnerId)
///     }
/// }
/// ```
pub trait ScopableEntity: EntityTrait {
    /// Primary key column used by `find_by_id`, `update_by_id` and `delete_by_id`.
    fn resource_col() -> Option<Self::Column>;

    /// Column holding the owning principal id.
    ///
    /// Entities without one are never visible through a restricted scope.
    fn owner_col() -> Option<Self::Column>;
}
