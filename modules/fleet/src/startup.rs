//! Store preparation run once before the listener binds.
//!
//! Order matters: the schema must converge first so that `owner_id` exists,
//! then the backfill hands orphaned rows to the default owner.

use std::fmt;

use botfleet_db::DbHandle;
use botfleet_db::ownership::{BackfillError, BackfillOutcome, BackfillReport};
use botfleet_db::schema::{DescriptorError, IntrospectError, MigrationReport};
use thiserror::Error;
use tracing::info;

use crate::infra::storage::{fleet_backfill_spec, fleet_schema};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid schema descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Introspect(#[from] IntrospectError),

    #[error(transparent)]
    Backfill(#[from] BackfillError),
}

/// Outcome of [`prepare_store`].
#[derive(Debug)]
pub struct StoreSummary {
    pub migration: MigrationReport,
    pub backfill: BackfillReport,
}

impl StoreSummary {
    /// At least one migration operation or backfill table failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.migration.is_degraded() || !self.backfill.failed.is_empty()
    }
}

impl fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema: {}; ownership: ", self.migration)?;
        match &self.backfill.outcome {
            BackfillOutcome::Deferred => f.write_str("deferred (no principals)")?,
            BackfillOutcome::Assigned { default_owner, .. } => write!(
                f,
                "{} rows assigned to principal {default_owner}",
                self.backfill.total_assigned()
            )?,
        }
        if !self.backfill.failed.is_empty() {
            write!(f, ", {} tables failed", self.backfill.failed.len())?;
        }
        Ok(())
    }
}

/// Converge the schema, then backfill ownership.
///
/// # Errors
/// Returns `StartupError` when the store cannot be read. Individual failed
/// operations do not error; check [`StoreSummary::is_degraded`].
pub async fn prepare_store(db: &DbHandle) -> Result<StoreSummary, StartupError> {
    let schema = fleet_schema();
    schema.validate()?;

    let migration = db.converge_schema(&schema).await?;

    let backfill = db.backfill_ownership(&fleet_backfill_spec()).await?;

    let summary = StoreSummary {
        migration,
        backfill,
    };
    info!(summary = %summary, degraded = summary.is_degraded(), "store prepared");
    Ok(summary)
}
