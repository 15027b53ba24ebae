//! Ledger-free, additive schema convergence.
//!
//! [`converge`] introspects the tables a [`SchemaDescriptor`] names, plans the
//! missing tables, columns and indexes, and executes the plan. Running it
//! against a converged store is a no-op.

pub mod descriptor;
pub mod executor;
pub mod introspect;
pub mod planner;
pub mod sql;

pub use descriptor::{
    ColumnDefault, ColumnSpec, ColumnType, DescriptorError, IndexSpec, SchemaDescriptor, TableSpec,
};
pub use executor::{
    FailedOperation, MigrationError, MigrationReport, OperationOutcome, execute,
};
pub use introspect::{IntrospectError, LiveSchema, TableState, introspect};
pub use planner::{MigrationOperation, MigrationPlan, OperationKind, plan};

use sea_orm::ConnectionTrait;
use tracing::info;

/// Introspect, plan and execute in one go.
///
/// # Errors
/// Returns `IntrospectError` if the live schema cannot be read. Per-operation
/// failures do not error; they are reported in the `MigrationReport`.
pub async fn converge<C>(
    conn: &C,
    descriptor: &SchemaDescriptor,
) -> Result<MigrationReport, IntrospectError>
where
    C: ConnectionTrait,
{
    let live = introspect(conn, &descriptor.table_names()).await?;
    let plan = plan(descriptor, &live);

    if plan.is_empty() {
        info!(tables = descriptor.tables().len(), "schema already converged");
        return Ok(MigrationReport::default());
    }

    info!(operations = plan.len(), "applying schema plan");
    let report = execute(conn, &plan).await;
    info!(
        applied = report.applied,
        already_satisfied = report.already_satisfied,
        failed = report.failed.len(),
        "schema convergence finished"
    );
    Ok(report)
}
