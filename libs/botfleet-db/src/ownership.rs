//! One-time assignment of a default owner to legacy resources.
//!
//! Resources created before ownership existed have `owner_id IS NULL` after the
//! column is added. The backfill hands all of them to the lowest principal id.
//! The `IS NULL` guard makes the operation converge to a no-op, so it is safe
//! to run on every start and under concurrent replicas.

use sea_orm::sea_query::{Alias, Expr, Func, Query};
use sea_orm::{ConnectionTrait, DbErr};
use thiserror::Error;
use tracing::{info, warn};

use crate::schema::introspect::{self, IntrospectError, is_connectivity};

/// Which tables and columns the backfill touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackfillSpec {
    pub principal_table: String,
    pub principal_id_column: String,
    pub owner_column: String,
    pub resource_tables: Vec<String>,
}

impl BackfillSpec {
    /// Spec with conventional column names: `id` on the principal table and
    /// `owner_id` on resources.
    #[must_use]
    pub fn new(principal_table: impl Into<String>) -> Self {
        Self {
            principal_table: principal_table.into(),
            principal_id_column: "id".to_owned(),
            owner_column: "owner_id".to_owned(),
            resource_tables: Vec::new(),
        }
    }

    #[must_use]
    pub fn owner_column(mut self, column: impl Into<String>) -> Self {
        self.owner_column = column.into();
        self
    }

    #[must_use]
    pub fn resource_table(mut self, table: impl Into<String>) -> Self {
        self.resource_tables.push(table.into());
        self
    }
}

/// Rows assigned in one resource table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableBackfill {
    pub table: String,
    pub rows_assigned: u64,
}

/// Whether the backfill ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// No principal exists yet; nothing was written.
    Deferred,
    Assigned {
        default_owner: i64,
        per_table: Vec<TableBackfill>,
    },
}

/// A resource table whose update failed.
#[derive(Debug)]
pub struct TableBackfillFailure {
    pub table: String,
    pub error: DbErr,
}

#[derive(Debug)]
pub struct BackfillReport {
    pub outcome: BackfillOutcome,
    /// Tables skipped because they or their owner column are absent.
    pub skipped: Vec<String>,
    pub failed: Vec<TableBackfillFailure>,
}

impl BackfillReport {
    fn deferred() -> Self {
        Self {
            outcome: BackfillOutcome::Deferred,
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Total rows that received the default owner in this run.
    #[must_use]
    pub fn total_assigned(&self) -> u64 {
        match &self.outcome {
            BackfillOutcome::Deferred => 0,
            BackfillOutcome::Assigned { per_table, .. } => {
                per_table.iter().map(|t| t.rows_assigned).sum()
            }
        }
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.outcome == BackfillOutcome::Deferred
    }
}

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("store unavailable while selecting default owner from '{table}': {source}")]
    StoreUnavailable { table: String, source: DbErr },

    #[error("failed to select default owner from '{table}': {source}")]
    PrincipalLookup { table: String, source: DbErr },

    #[error(transparent)]
    Introspect(#[from] IntrospectError),
}

/// Lowest principal id, or `None` when the table is empty.
async fn default_owner<C>(conn: &C, spec: &BackfillSpec) -> Result<Option<i64>, BackfillError>
where
    C: ConnectionTrait,
{
    let lookup_err = |source: DbErr| {
        let table = spec.principal_table.clone();
        if is_connectivity(&source) {
            BackfillError::StoreUnavailable { table, source }
        } else {
            BackfillError::PrincipalLookup { table, source }
        }
    };

    let stmt = Query::select()
        .expr(Func::min(Expr::col(Alias::new(&spec.principal_id_column))))
        .from(Alias::new(&spec.principal_table))
        .to_owned();
    let row = conn
        .query_one(conn.get_database_backend().build(&stmt))
        .await
        .map_err(lookup_err)?;

    match row {
        Some(row) => row.try_get_by_index::<Option<i64>>(0).map_err(lookup_err),
        None => Ok(None),
    }
}

/// Assign the default owner to every row lacking one.
///
/// # Errors
/// Returns `BackfillError` when the principal table cannot be read. Failures
/// on individual resource tables are recorded in the report instead.
pub async fn backfill_ownership<C>(
    conn: &C,
    spec: &BackfillSpec,
) -> Result<BackfillReport, BackfillError>
where
    C: ConnectionTrait,
{
    if !introspect::table_state(conn, &spec.principal_table)
        .await?
        .is_present()
    {
        warn!(
            table = %spec.principal_table,
            "principal table is missing; ownership backfill deferred"
        );
        return Ok(BackfillReport::deferred());
    }

    let Some(owner) = default_owner(conn, spec).await? else {
        info!(
            table = %spec.principal_table,
            "no principal registered yet; ownership backfill deferred"
        );
        return Ok(BackfillReport::deferred());
    };

    let mut per_table = Vec::with_capacity(spec.resource_tables.len());
    let mut skipped = Vec::new();
    let mut failed = Vec::new();

    for table in &spec.resource_tables {
        let state = introspect::table_state(conn, table).await?;
        if !state.has_column(&spec.owner_column) {
            warn!(
                table = %table,
                column = %spec.owner_column,
                "owner column absent; skipping ownership backfill for table"
            );
            skipped.push(table.clone());
            continue;
        }

        let stmt = Query::update()
            .table(Alias::new(table))
            .value(Alias::new(&spec.owner_column), owner)
            .and_where(Expr::col(Alias::new(&spec.owner_column)).is_null())
            .to_owned();

        match conn.execute(conn.get_database_backend().build(&stmt)).await {
            Ok(res) => {
                let rows = res.rows_affected();
                if rows > 0 {
                    info!(table = %table, owner_id = owner, rows, "assigned default owner");
                }
                per_table.push(TableBackfill {
                    table: table.clone(),
                    rows_assigned: rows,
                });
            }
            Err(error) => {
                warn!(table = %table, error = %error, "ownership backfill failed for table");
                failed.push(TableBackfillFailure {
                    table: table.clone(),
                    error,
                });
            }
        }
    }

    Ok(BackfillReport {
        outcome: BackfillOutcome::Assigned {
            default_owner: owner,
            per_table,
        },
        skipped,
        failed,
    })
}
