//! DDL rendering for the supported engines.
//!
//! Every statement is existence-guarded where the engine allows it. `SQLite`
//! has no `ADD COLUMN IF NOT EXISTS`; the executor re-checks the column first.

use sea_orm::DatabaseBackend;

use super::descriptor::{ColumnDefault, ColumnSpec, ColumnType, IndexSpec, TableSpec};
use super::planner::MigrationOperation;

/// Rendering failure; surfaces as a failed operation.
#[derive(Debug, thiserror::Error)]
#[error("unsupported database backend: {0:?}")]
pub struct UnsupportedBackend(pub DatabaseBackend);

/// Double-quote an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn type_sql(backend: DatabaseBackend, ty: ColumnType) -> &'static str {
    match (backend, ty) {
        (DatabaseBackend::Postgres, ColumnType::BigInt) => "BIGINT",
        (DatabaseBackend::Postgres, ColumnType::Timestamp) => "TIMESTAMPTZ",
        (DatabaseBackend::Postgres, ColumnType::Json) => "JSONB",
        (_, ColumnType::BigInt) => "INTEGER",
        (_, ColumnType::Boolean) => "BOOLEAN",
        (_, ColumnType::Text | ColumnType::Timestamp | ColumnType::Json) => "TEXT",
    }
}

fn default_sql(default: &ColumnDefault) -> String {
    match default {
        ColumnDefault::CurrentTimestamp => "CURRENT_TIMESTAMP".to_owned(),
        ColumnDefault::Bool(true) => "TRUE".to_owned(),
        ColumnDefault::Bool(false) => "FALSE".to_owned(),
        ColumnDefault::Int(n) => n.to_string(),
        ColumnDefault::Text(text) => quote_literal(text),
    }
}

/// Column definition as it appears inside `CREATE TABLE` or after `ADD COLUMN`.
#[must_use]
pub fn column_def(backend: DatabaseBackend, column: &ColumnSpec) -> String {
    let name = quote_ident(&column.name);
    if column.primary_key {
        return match backend {
            DatabaseBackend::Postgres => format!("{name} BIGSERIAL PRIMARY KEY"),
            _ => format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT"),
        };
    }

    let mut def = format!("{name} {}", type_sql(backend, column.ty));
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if column.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(&default_sql(default));
    }
    def
}

fn create_table(backend: DatabaseBackend, table: &TableSpec) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| column_def(backend, c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({columns})",
        quote_ident(&table.name)
    )
}

fn add_column(backend: DatabaseBackend, table: &str, column: &ColumnSpec) -> String {
    let guard = match backend {
        DatabaseBackend::Postgres => "IF NOT EXISTS ",
        _ => "",
    };
    format!(
        "ALTER TABLE {} ADD COLUMN {guard}{}",
        quote_ident(table),
        column_def(backend, column)
    )
}

fn create_index(table: &str, index: &IndexSpec) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let columns = index
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE {unique}INDEX IF NOT EXISTS {} ON {} ({columns})",
        quote_ident(&index.name),
        quote_ident(table)
    )
}

/// Render one operation as a single DDL statement.
///
/// # Errors
/// Returns `UnsupportedBackend` for engines other than `SQLite` and `PostgreSQL`.
pub fn render(
    backend: DatabaseBackend,
    operation: &MigrationOperation,
) -> Result<String, UnsupportedBackend> {
    if matches!(backend, DatabaseBackend::MySql) {
        return Err(UnsupportedBackend(backend));
    }
    Ok(match operation {
        MigrationOperation::CreateTable { table } => create_table(backend, table),
        MigrationOperation::AddColumn { table, column } => add_column(backend, table, column),
        MigrationOperation::CreateIndex { table, index } => create_index(table, index),
    })
}
