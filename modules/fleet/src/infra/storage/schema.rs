//! The schema this binary expects, and which tables take part in the ownership
//! backfill.
//!
//! Columns that may be added to an existing, populated table must be nullable
//! or carry a constant default. Only columns present since a table was first
//! created are `NOT NULL` without default.

use botfleet_db::ownership::BackfillSpec;
use botfleet_db::schema::{
    ColumnDefault, ColumnSpec, ColumnType, IndexSpec, SchemaDescriptor, TableSpec,
};

pub const USERS: &str = "users";
pub const BOTS: &str = "bots";
pub const LEADS: &str = "leads";
pub const FLOWS: &str = "flows";
pub const TRACKING_LINKS: &str = "tracking_links";
pub const AUDIT_LOGS: &str = "audit_logs";

/// Resource tables subject to owner scoping, in backfill order.
pub const OWNED_TABLES: [&str; 4] = [BOTS, LEADS, FLOWS, TRACKING_LINKS];

fn created_at() -> ColumnSpec {
    ColumnSpec::new("created_at", ColumnType::Timestamp).default(ColumnDefault::CurrentTimestamp)
}

fn owner_id() -> ColumnSpec {
    ColumnSpec::new("owner_id", ColumnType::BigInt).nullable()
}

fn bot_id() -> ColumnSpec {
    ColumnSpec::new("bot_id", ColumnType::BigInt).nullable()
}

fn owner_index(table: &str) -> IndexSpec {
    IndexSpec::new(format!("ix_{table}_owner_id"), ["owner_id"])
}

#[must_use]
pub fn fleet_schema() -> SchemaDescriptor {
    SchemaDescriptor::new()
        .table(
            TableSpec::new(USERS)
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("username", ColumnType::Text).unique())
                .column(ColumnSpec::new("email", ColumnType::Text).unique())
                .column(ColumnSpec::new("password_hash", ColumnType::Text))
                .column(
                    ColumnSpec::new("is_active", ColumnType::Boolean)
                        .default(ColumnDefault::Bool(true)),
                )
                .column(
                    ColumnSpec::new("is_superuser", ColumnType::Boolean)
                        .default(ColumnDefault::Bool(false)),
                )
                .column(created_at()),
        )
        .table(
            TableSpec::new(BOTS)
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("name", ColumnType::Text))
                .column(ColumnSpec::new("platform_token", ColumnType::Text))
                .column(ColumnSpec::new("description", ColumnType::Text).nullable())
                .column(
                    ColumnSpec::new("is_active", ColumnType::Boolean)
                        .default(ColumnDefault::Bool(true)),
                )
                .column(created_at())
                .column(ColumnSpec::new("updated_at", ColumnType::Timestamp).nullable())
                .column(owner_id())
                .index(owner_index(BOTS)),
        )
        .table(
            TableSpec::new(LEADS)
                .column(ColumnSpec::id())
                .column(bot_id())
                .column(ColumnSpec::new("external_user_id", ColumnType::Text))
                .column(ColumnSpec::new("display_name", ColumnType::Text).nullable())
                .column(
                    ColumnSpec::new("stage", ColumnType::Text)
                        .default(ColumnDefault::Text("new".to_owned())),
                )
                .column(created_at())
                .column(owner_id())
                .index(owner_index(LEADS)),
        )
        .table(
            TableSpec::new(FLOWS)
                .column(ColumnSpec::id())
                .column(bot_id())
                .column(ColumnSpec::new("name", ColumnType::Text))
                .column(ColumnSpec::new("definition", ColumnType::Json).nullable())
                .column(
                    ColumnSpec::new("is_active", ColumnType::Boolean)
                        .default(ColumnDefault::Bool(true)),
                )
                .column(created_at())
                .column(owner_id())
                .index(owner_index(FLOWS)),
        )
        .table(
            TableSpec::new(TRACKING_LINKS)
                .column(ColumnSpec::id())
                .column(bot_id())
                .column(ColumnSpec::new("slug", ColumnType::Text).unique())
                .column(ColumnSpec::new("target_url", ColumnType::Text))
                .column(ColumnSpec::new("clicks", ColumnType::BigInt).default(ColumnDefault::Int(0)))
                .column(created_at())
                .column(owner_id())
                .index(owner_index(TRACKING_LINKS)),
        )
        .table(
            TableSpec::new(AUDIT_LOGS)
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("principal_id", ColumnType::BigInt).nullable())
                .column(ColumnSpec::new("username", ColumnType::Text).nullable())
                .column(ColumnSpec::new("action", ColumnType::Text))
                .column(ColumnSpec::new("resource_type", ColumnType::Text))
                .column(ColumnSpec::new("resource_id", ColumnType::BigInt).nullable())
                .column(ColumnSpec::new("description", ColumnType::Text))
                .column(ColumnSpec::new("details", ColumnType::Json).nullable())
                .column(ColumnSpec::new("client_ip", ColumnType::Text).nullable())
                .column(ColumnSpec::new("user_agent", ColumnType::Text).nullable())
                .column(ColumnSpec::new("success", ColumnType::Boolean).default(ColumnDefault::Bool(true)))
                .column(ColumnSpec::new("error_message", ColumnType::Text).nullable())
                .column(created_at())
                .index(IndexSpec::new("ix_audit_logs_principal_id", ["principal_id"]))
                .index(IndexSpec::new("ix_audit_logs_created_at", ["created_at"])),
        )
}

/// Owned tables receive the lowest principal id. `audit_logs` is not owned and
/// is never backfilled.
#[must_use]
pub fn fleet_backfill_spec() -> BackfillSpec {
    OWNED_TABLES
        .iter()
        .fold(BackfillSpec::new(USERS), |spec, table| spec.resource_table(*table))
}
