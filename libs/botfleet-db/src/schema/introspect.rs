//! Read-only view of the live schema.
//!
//! Only the tables a descriptor names are inspected; anything else in the
//! store is invisible to the planner.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};
use thiserror::Error;

/// Introspection failures. Both variants are fatal for a migration run.
#[derive(Debug, Error)]
pub enum IntrospectError {
    /// The store could not be reached (pool timeout, I/O, closed pool).
    #[error("store unavailable while introspecting '{table}': {source}")]
    StoreUnavailable { table: String, source: DbErr },

    /// The catalog query itself failed.
    #[error("failed to introspect table '{table}': {source}")]
    Query { table: String, source: DbErr },

    #[error("unsupported database backend: {0:?}")]
    UnsupportedBackend(DatabaseBackend),
}

impl IntrospectError {
    fn from_db(table: &str, source: DbErr) -> Self {
        if is_connectivity(&source) {
            Self::StoreUnavailable {
                table: table.to_owned(),
                source,
            }
        } else {
            Self::Query {
                table: table.to_owned(),
                source,
            }
        }
    }
}

/// Live state of one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableState {
    Missing,
    Present {
        columns: BTreeSet<String>,
        indexes: BTreeSet<String>,
    },
}

impl TableState {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        match self {
            Self::Missing => false,
            Self::Present { columns, .. } => columns.contains(column),
        }
    }

    #[must_use]
    pub fn has_index(&self, index: &str) -> bool {
        match self {
            Self::Missing => false,
            Self::Present { indexes, .. } => indexes.contains(index),
        }
    }
}

static MISSING: TableState = TableState::Missing;

/// Introspection result keyed by table name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveSchema {
    tables: BTreeMap<String, TableState>,
}

impl LiveSchema {
    /// State of `table`; tables that were never inspected read as missing.
    #[must_use]
    pub fn table(&self, table: &str) -> &TableState {
        self.tables.get(table).unwrap_or(&MISSING)
    }

    pub fn insert(&mut self, table: impl Into<String>, state: TableState) {
        self.tables.insert(table.into(), state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableState)> {
        self.tables.iter().map(|(name, state)| (name.as_str(), state))
    }
}

/// Inspect each of `tables` in the live store.
///
/// # Errors
/// Returns `IntrospectError::StoreUnavailable` on connectivity failures and
/// `IntrospectError::Query` when a catalog query fails.
pub async fn introspect<C>(conn: &C, tables: &[&str]) -> Result<LiveSchema, IntrospectError>
where
    C: ConnectionTrait,
{
    let mut live = LiveSchema::default();
    for table in tables {
        let state = table_state(conn, table).await?;
        tracing::debug!(
            table = %table,
            present = state.is_present(),
            "introspected table"
        );
        live.insert(*table, state);
    }
    Ok(live)
}

/// Inspect a single table.
///
/// # Errors
/// Same as [`introspect`].
pub async fn table_state<C>(conn: &C, table: &str) -> Result<TableState, IntrospectError>
where
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();
    if !table_exists(conn, backend, table).await? {
        return Ok(TableState::Missing);
    }
    let columns = names(conn, backend, table, columns_sql(backend)?).await?;
    let indexes = names(conn, backend, table, indexes_sql(backend)?).await?;
    Ok(TableState::Present { columns, indexes })
}

async fn table_exists<C>(
    conn: &C,
    backend: DatabaseBackend,
    table: &str,
) -> Result<bool, IntrospectError>
where
    C: ConnectionTrait,
{
    let sql = match backend {
        DatabaseBackend::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table' AND name = $1",
        DatabaseBackend::Postgres => {
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1"
        }
        DatabaseBackend::MySql => return Err(IntrospectError::UnsupportedBackend(backend)),
    };
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, [table.into()]))
        .await
        .map_err(|e| IntrospectError::from_db(table, e))?;
    Ok(row.is_some())
}

fn columns_sql(backend: DatabaseBackend) -> Result<&'static str, IntrospectError> {
    match backend {
        DatabaseBackend::Sqlite => Ok("SELECT name FROM pragma_table_info($1)"),
        DatabaseBackend::Postgres => Ok("SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1"),
        DatabaseBackend::MySql => Err(IntrospectError::UnsupportedBackend(backend)),
    }
}

fn indexes_sql(backend: DatabaseBackend) -> Result<&'static str, IntrospectError> {
    match backend {
        DatabaseBackend::Sqlite => {
            Ok("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = $1")
        }
        DatabaseBackend::Postgres => Ok("SELECT indexname::text FROM pg_indexes \
             WHERE schemaname = current_schema() AND tablename = $1"),
        DatabaseBackend::MySql => Err(IntrospectError::UnsupportedBackend(backend)),
    }
}

async fn names<C>(
    conn: &C,
    backend: DatabaseBackend,
    table: &str,
    sql: &str,
) -> Result<BTreeSet<String>, IntrospectError>
where
    C: ConnectionTrait,
{
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, [table.into()]))
        .await
        .map_err(|e| IntrospectError::from_db(table, e))?;

    rows.iter()
        .map(|row| {
            row.try_get_by_index::<String>(0)
                .map_err(|e| IntrospectError::from_db(table, e))
        })
        .collect()
}

/// Whether `err` means the store itself is unreachable, as opposed to a bad query.
#[must_use]
pub fn is_connectivity(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        #[cfg(any(feature = "pg", feature = "sqlite"))]
        DbErr::Exec(sea_orm::RuntimeErr::SqlxError(inner))
        | DbErr::Query(sea_orm::RuntimeErr::SqlxError(inner)) => {
            use sea_orm::sqlx::Error as SqlxError;
            let inner: &SqlxError = std::borrow::Borrow::borrow(inner);
            matches!(
                inner,
                SqlxError::Io(_)
                    | SqlxError::Tls(_)
                    | SqlxError::PoolTimedOut
                    | SqlxError::PoolClosed
                    | SqlxError::WorkerCrashed
            )
        }
        _ => false,
    }
}
