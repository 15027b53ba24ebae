#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "sqlite")]

mod common;

use botfleet_db::schema::{
    self, ColumnSpec, ColumnType, MigrationOperation, MigrationPlan, OperationKind, TableSpec,
    TableState, introspect, plan,
};
use common::{columns, descriptor, exec, inmem_db, raw, sqlite_master};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, ExecResult, QueryResult, Statement,
};

/// Connection whose DDL always loses to another replica: the competing
/// statement lands first, then ours is rejected with the error PostgreSQL
/// reports when two sessions race on `CREATE TABLE IF NOT EXISTS`.
struct LosingReplica {
    inner: DatabaseConnection,
    competing_ddl: &'static str,
}

#[async_trait::async_trait]
impl ConnectionTrait for LosingReplica {
    fn get_database_backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, _stmt: Statement) -> Result<ExecResult, DbErr> {
        self.inner.execute_unprepared(self.competing_ddl).await?;
        Err(DbErr::Custom(
            "duplicate key value violates unique constraint \"pg_type_typname_nsp_index\""
                .to_owned(),
        ))
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.inner.execute_unprepared(sql).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.inner.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.inner.query_all(stmt).await
    }
}

#[tokio::test]
async fn empty_store_reports_every_table_missing() {
    let db = inmem_db().await;
    let live = introspect(&raw(&db), &["users", "bots"]).await.unwrap();
    assert_eq!(live.table("users"), &TableState::Missing);
    assert_eq!(live.table("bots"), &TableState::Missing);
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let db = inmem_db().await;
    let conn = raw(&db);
    let desc = descriptor();

    let first = db.converge_schema(&desc).await.unwrap();
    assert!(!first.is_degraded(), "{first:?}");
    assert_eq!(first.applied, 5, "3 tables + 2 indexes");
    let before = sqlite_master(&conn).await;

    let live = introspect(&conn, &desc.table_names()).await.unwrap();
    assert!(plan(&desc, &live).is_empty());

    let second = db.converge_schema(&desc).await.unwrap();
    assert_eq!(second.applied, 0);
    assert_eq!(second.to_string(), "0 applied, 0 already satisfied, 0 failed");
    assert_eq!(sqlite_master(&conn).await, before);
}

#[tokio::test]
async fn partial_store_converges_to_the_same_shape_as_an_empty_one() {
    let fresh = inmem_db().await;
    fresh.converge_schema(&descriptor()).await.unwrap();

    let legacy = inmem_db().await;
    let conn = raw(&legacy);
    exec(
        &conn,
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, username TEXT NOT NULL UNIQUE, \
         is_active BOOLEAN NOT NULL DEFAULT TRUE, created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP)",
    )
    .await;
    exec(
        &conn,
        "CREATE TABLE bots (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
    )
    .await;
    exec(&conn, "INSERT INTO bots (name) VALUES ('legacy')").await;

    let report = legacy.converge_schema(&descriptor()).await.unwrap();
    assert!(!report.is_degraded(), "{report:?}");

    for table in ["users", "bots", "flows"] {
        assert_eq!(
            columns(&conn, table).await,
            columns(&raw(&fresh), table).await,
            "columns of {table}"
        );
    }
    assert_eq!(
        common::scalar_i64(&conn, "SELECT COUNT(*) FROM bots WHERE name = 'legacy'").await,
        1,
        "existing rows survive"
    );
}

#[tokio::test]
async fn partial_plan_lists_columns_before_indexes() {
    let db = inmem_db().await;
    let conn = raw(&db);
    exec(
        &conn,
        "CREATE TABLE bots (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
    )
    .await;

    let desc = descriptor();
    let live = introspect(&conn, &desc.table_names()).await.unwrap();
    let planned = plan(&desc, &live);
    let bots: Vec<_> = planned
        .iter()
        .filter(|op| op.table() == "bots")
        .map(MigrationOperation::kind)
        .collect();
    assert_eq!(
        bots,
        vec![
            OperationKind::AddColumn,
            OperationKind::AddColumn,
            OperationKind::CreateIndex
        ]
    );
}

#[tokio::test]
async fn concurrent_replica_work_counts_as_already_satisfied() {
    let db = inmem_db().await;
    let conn = raw(&db);
    exec(
        &conn,
        "CREATE TABLE bots (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
    )
    .await;

    let desc = descriptor();
    let live = introspect(&conn, &desc.table_names()).await.unwrap();
    let planned = plan(&desc, &live);

    // Another replica adds the column between our plan and our execution.
    exec(&conn, "ALTER TABLE bots ADD COLUMN owner_id INTEGER").await;

    let report = schema::execute(&conn, &planned).await;
    assert!(!report.is_degraded(), "{report:?}");
    assert_eq!(report.already_satisfied, 1);
    assert!(columns(&conn, "bots").await.contains("description"));
}

#[tokio::test]
async fn rejected_operation_degrades_the_run_but_siblings_apply() {
    let db = inmem_db().await;
    let conn = raw(&db);
    exec(
        &conn,
        "CREATE TABLE bots (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
    )
    .await;

    // SQLite refuses to add a NOT NULL column without a default.
    let desc = schema::SchemaDescriptor::new()
        .table(
            TableSpec::new("bots")
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("name", ColumnType::Text))
                .column(ColumnSpec::new("platform_token", ColumnType::Text))
                .column(ColumnSpec::new("owner_id", ColumnType::BigInt).nullable()),
        )
        .table(
            TableSpec::new("leads")
                .column(ColumnSpec::id())
                .column(ColumnSpec::new("owner_id", ColumnType::BigInt).nullable()),
        );

    let report = db.converge_schema(&desc).await.unwrap();
    assert!(report.is_degraded());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].operation.table(), "bots");
    assert_eq!(report.applied, 2, "owner_id column and leads table");
    assert!(columns(&conn, "bots").await.contains("owner_id"));
    assert!(columns(&conn, "leads").await.contains("owner_id"));
}

#[tokio::test]
async fn empty_plan_executes_nothing() {
    let db = inmem_db().await;
    let report = schema::execute(&raw(&db), &MigrationPlan::default()).await;
    assert_eq!(report.succeeded(), 0);
    assert!(!report.is_degraded());
}

#[tokio::test]
async fn closed_pool_is_store_unavailable() {
    let db = inmem_db().await;
    let conn = raw(&db);
    db.close().await;

    let err = introspect(&conn, &["users"]).await.unwrap_err();
    assert!(
        matches!(err, schema::IntrospectError::StoreUnavailable { .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn statement_lost_to_a_replica_is_already_satisfied() {
    let db = inmem_db().await;
    let racing = LosingReplica {
        inner: raw(&db),
        competing_ddl: "CREATE TABLE leads (id INTEGER PRIMARY KEY AUTOINCREMENT)",
    };
    let create = MigrationOperation::CreateTable {
        table: TableSpec::new("leads").column(ColumnSpec::id()),
    };

    let outcome = schema::executor::execute_one(&racing, &create).await;
    assert!(
        matches!(outcome, schema::OperationOutcome::AlreadySatisfied),
        "{outcome:?}"
    );
}

#[tokio::test]
async fn rejected_statement_with_object_still_absent_is_failed() {
    let db = inmem_db().await;
    // The competing statement touches something else; `leads` never appears.
    let racing = LosingReplica {
        inner: raw(&db),
        competing_ddl: "CREATE TABLE IF NOT EXISTS unrelated (id INTEGER)",
    };
    let create = MigrationOperation::CreateTable {
        table: TableSpec::new("leads").column(ColumnSpec::id()),
    };

    let outcome = schema::executor::execute_one(&racing, &create).await;
    assert!(
        matches!(outcome, schema::OperationOutcome::Failed { .. }),
        "{outcome:?}"
    );
}
