//! Applies a [`MigrationPlan`] one operation at a time.
//!
//! Each statement runs on its own and commits independently; there is no
//! transaction spanning the plan. A failed operation is logged and recorded,
//! and the remaining operations still run.

use std::fmt;

use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::introspect::{self, IntrospectError};
use super::planner::{MigrationOperation, MigrationPlan};
use super::sql;

/// Why a single operation failed.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("{operation} failed: {source}")]
    OperationFailed {
        operation: String,
        #[source]
        source: DbErr,
    },

    #[error("pre-check for {operation} failed: {source}")]
    PreCheck {
        operation: String,
        #[source]
        source: IntrospectError,
    },

    #[error(transparent)]
    Render(#[from] sql::UnsupportedBackend),
}

/// Outcome of one operation.
#[derive(Debug)]
pub enum OperationOutcome {
    Applied,
    AlreadySatisfied,
    Failed { error: MigrationError },
}

/// An operation that did not apply, with the reason.
#[derive(Debug)]
pub struct FailedOperation {
    pub operation: MigrationOperation,
    pub error: MigrationError,
}

/// Aggregate result of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: usize,
    pub already_satisfied: usize,
    pub failed: Vec<FailedOperation>,
}

impl MigrationReport {
    /// At least one operation failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Operations that ended applied or already satisfied.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.applied + self.already_satisfied
    }

    fn record(&mut self, operation: &MigrationOperation, outcome: OperationOutcome) {
        match outcome {
            OperationOutcome::Applied => self.applied += 1,
            OperationOutcome::AlreadySatisfied => self.already_satisfied += 1,
            OperationOutcome::Failed { error } => self.failed.push(FailedOperation {
                operation: operation.clone(),
                error,
            }),
        }
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} already satisfied, {} failed",
            self.applied,
            self.already_satisfied,
            self.failed.len()
        )
    }
}

/// Execute every operation of `plan` in order.
pub async fn execute<C>(conn: &C, plan: &MigrationPlan) -> MigrationReport
where
    C: ConnectionTrait,
{
    let mut report = MigrationReport::default();
    for operation in plan {
        let outcome = execute_one(conn, operation).await;
        match &outcome {
            OperationOutcome::Applied => info!(
                kind = %operation.kind(),
                table = %operation.table(),
                "applied: {operation}"
            ),
            OperationOutcome::AlreadySatisfied => debug!(
                kind = %operation.kind(),
                table = %operation.table(),
                "already satisfied: {operation}"
            ),
            OperationOutcome::Failed { error } => error!(
                kind = %operation.kind(),
                table = %operation.table(),
                error = %error,
                "migration operation failed: {operation}"
            ),
        }
        report.record(operation, outcome);
    }
    report
}

/// Execute one operation, re-checking the live schema first.
pub async fn execute_one<C>(conn: &C, operation: &MigrationOperation) -> OperationOutcome
where
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();

    match already_present(conn, operation).await {
        Ok(true) => return OperationOutcome::AlreadySatisfied,
        Ok(false) => {}
        Err(source) => {
            return OperationOutcome::Failed {
                error: MigrationError::PreCheck {
                    operation: operation.to_string(),
                    source,
                },
            };
        }
    }

    if let MigrationOperation::AddColumn { table, column } = operation
        && backend == DatabaseBackend::Sqlite
        && !column.is_addable()
    {
        warn!(
            table = %table,
            column = %column.name,
            "column is not addable to an existing SQLite table; expect failure"
        );
    }

    let ddl = match sql::render(backend, operation) {
        Ok(ddl) => ddl,
        Err(e) => return OperationOutcome::Failed { error: e.into() },
    };
    debug!(sql = %ddl, "executing DDL");

    match conn.execute(Statement::from_string(backend, ddl)).await {
        Ok(_) => OperationOutcome::Applied,
        Err(source) => settle_failure(conn, operation, source).await,
    }
}

/// A rejected statement only counts as failed while the object is still
/// absent. Replicas racing on the same DDL see different errors per engine
/// (duplicate column, relation exists, catalog unique violation), so the
/// live schema decides rather than the error text.
async fn settle_failure<C>(
    conn: &C,
    operation: &MigrationOperation,
    source: DbErr,
) -> OperationOutcome
where
    C: ConnectionTrait,
{
    match already_present(conn, operation).await {
        Ok(true) => {
            debug!(error = %source, "created concurrently: {operation}");
            OperationOutcome::AlreadySatisfied
        }
        Ok(false) | Err(_) => OperationOutcome::Failed {
            error: MigrationError::OperationFailed {
                operation: operation.to_string(),
                source,
            },
        },
    }
}

async fn already_present<C>(
    conn: &C,
    operation: &MigrationOperation,
) -> Result<bool, IntrospectError>
where
    C: ConnectionTrait,
{
    let state = introspect::table_state(conn, operation.table()).await?;
    Ok(match operation {
        MigrationOperation::CreateTable { .. } => state.is_present(),
        MigrationOperation::AddColumn { column, .. } => state.has_column(&column.name),
        MigrationOperation::CreateIndex { index, .. } => state.has_index(&index.name),
    })
}
