#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::collections::BTreeSet;

use botfleet_db::schema::{
    ColumnDefault, ColumnSpec, ColumnType, IndexSpec, SchemaDescriptor, TableSpec,
};
use botfleet_db::{ConnectOpts, DbHandle};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

/// Single-connection in-memory store; every pooled connection to
/// `sqlite::memory:` would otherwise be a separate database.
pub async fn inmem_db() -> DbHandle {
    let opts = ConnectOpts {
        max_conns: Some(1),
        min_conns: Some(1),
        ..Default::default()
    };
    DbHandle::connect("sqlite::memory:", opts)
        .await
        .expect("Failed to connect to database")
}

pub fn raw(db: &DbHandle) -> DatabaseConnection {
    db.sea_secure().conn().clone()
}

pub async fn exec(conn: &DatabaseConnection, sql: &str) {
    conn.execute_unprepared(sql)
        .await
        .unwrap_or_else(|e| panic!("failed to execute `{sql}`: {e}"));
}

pub async fn scalar_i64(conn: &DatabaseConnection, sql: &str) -> i64 {
    let row = conn
        .query_one(Statement::from_string(conn.get_database_backend(), sql))
        .await
        .unwrap()
        .expect("query returned no row");
    row.try_get_by_index::<i64>(0).unwrap()
}

/// `(name, sql)` of every object in `sqlite_master`, sorted.
pub async fn sqlite_master(conn: &DatabaseConnection) -> Vec<(String, String)> {
    let rows = conn
        .query_all(Statement::from_string(
            conn.get_database_backend(),
            "SELECT name, COALESCE(sql, '') FROM sqlite_master \
             WHERE name NOT LIKE 'sqlite_%' ORDER BY name",
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|r| {
            (
                r.try_get_by_index::<String>(0).unwrap(),
                r.try_get_by_index::<String>(1).unwrap(),
            )
        })
        .collect()
}

pub async fn columns(conn: &DatabaseConnection, table: &str) -> BTreeSet<String> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            conn.get_database_backend(),
            "SELECT name FROM pragma_table_info($1)",
            [table.into()],
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|r| r.try_get_by_index::<String>(0).unwrap())
        .collect()
}

/// A small descriptor shaped like the application's: principals plus two
/// owned resource tables.
pub fn descriptor() -> SchemaDescriptor {
    SchemaDescriptor::new()
        .table(
            TableSpec::new("users")
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("username", ColumnType::Text).unique())
                .column(
                    ColumnSpec::new("is_active", ColumnType::Boolean)
                        .default(ColumnDefault::Bool(true)),
                )
                .column(
                    ColumnSpec::new("created_at", ColumnType::Timestamp)
                        .default(ColumnDefault::CurrentTimestamp),
                ),
        )
        .table(
            TableSpec::new("bots")
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("name", ColumnType::Text))
                .column(ColumnSpec::new("description", ColumnType::Text).nullable())
                .column(ColumnSpec::new("owner_id", ColumnType::BigInt).nullable())
                .index(IndexSpec::new("ix_bots_owner_id", ["owner_id"])),
        )
        .table(
            TableSpec::new("flows")
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("name", ColumnType::Text))
                .column(ColumnSpec::new("definition", ColumnType::Json).nullable())
                .column(ColumnSpec::new("owner_id", ColumnType::BigInt).nullable())
                .index(IndexSpec::new("ix_flows_owner_id", ["owner_id"])),
        )
}
