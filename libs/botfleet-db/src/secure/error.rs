/// Errors that can occur during scoped query execution.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError {
    /// Database error occurred during query execution.
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// The entity does not support the requested operation.
    #[error("invalid scope: {0}")]
    Invalid(&'static str),

    /// Operation denied by the current scope.
    #[error("access denied: {0}")]
    Denied(&'static str),

    /// No row matched both the id and the scope. Covers rows that do not
    /// exist and rows owned by someone else alike.
    #[error("not found")]
    NotFound,
}
