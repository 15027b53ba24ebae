#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "sqlite")]

mod common;

use botfleet_db::ownership::{BackfillOutcome, BackfillSpec, backfill_ownership};
use common::{descriptor, exec, inmem_db, raw, scalar_i64};

fn spec() -> BackfillSpec {
    BackfillSpec::new("users")
        .resource_table("bots")
        .resource_table("flows")
}

#[tokio::test]
async fn every_resource_gets_the_lowest_principal_id() {
    let db = inmem_db().await;
    let conn = raw(&db);
    db.converge_schema(&descriptor()).await.unwrap();

    // Registered out of id order.
    exec(&conn, "INSERT INTO users (id, username) VALUES (7, 'carol')").await;
    exec(&conn, "INSERT INTO users (id, username) VALUES (3, 'alice')").await;
    exec(&conn, "INSERT INTO users (id, username) VALUES (5, 'bob')").await;

    exec(&conn, "INSERT INTO bots (name) VALUES ('a'), ('b')").await;
    exec(&conn, "INSERT INTO bots (name, owner_id) VALUES ('c', 5)").await;
    exec(&conn, "INSERT INTO flows (name) VALUES ('f')").await;

    let report = db.backfill_ownership(&spec()).await.unwrap();
    match &report.outcome {
        BackfillOutcome::Assigned {
            default_owner,
            per_table,
        } => {
            assert_eq!(*default_owner, 3);
            assert_eq!(per_table.len(), 2);
            assert_eq!(per_table[0].table, "bots");
            assert_eq!(per_table[0].rows_assigned, 2);
            assert_eq!(per_table[1].rows_assigned, 1);
        }
        BackfillOutcome::Deferred => panic!("backfill should have run"),
    }
    assert_eq!(report.total_assigned(), 3);

    for table in ["bots", "flows"] {
        let unowned =
            scalar_i64(&conn, &format!("SELECT COUNT(*) FROM {table} WHERE owner_id IS NULL")).await;
        assert_eq!(unowned, 0, "{table}");
    }
    assert_eq!(
        scalar_i64(&conn, "SELECT owner_id FROM bots WHERE name = 'c'").await,
        5,
        "existing owners are untouched"
    );
}

#[tokio::test]
async fn rerun_assigns_nothing() {
    let db = inmem_db().await;
    let conn = raw(&db);
    db.converge_schema(&descriptor()).await.unwrap();
    exec(&conn, "INSERT INTO users (username) VALUES ('alice')").await;
    exec(&conn, "INSERT INTO bots (name) VALUES ('a')").await;

    assert_eq!(db.backfill_ownership(&spec()).await.unwrap().total_assigned(), 1);
    assert_eq!(db.backfill_ownership(&spec()).await.unwrap().total_assigned(), 0);
}

#[tokio::test]
async fn no_principals_defers_without_writing() {
    let db = inmem_db().await;
    let conn = raw(&db);
    db.converge_schema(&descriptor()).await.unwrap();
    exec(&conn, "INSERT INTO bots (name) VALUES ('orphan')").await;

    let report = backfill_ownership(&conn, &spec()).await.unwrap();
    assert!(report.is_deferred());
    assert_eq!(report.total_assigned(), 0);
    assert_eq!(
        scalar_i64(&conn, "SELECT COUNT(*) FROM bots WHERE owner_id IS NULL").await,
        1
    );
}

#[tokio::test]
async fn missing_principal_table_defers() {
    let db = inmem_db().await;
    let report = db.backfill_ownership(&spec()).await.unwrap();
    assert_eq!(report.outcome, BackfillOutcome::Deferred);
}

#[tokio::test]
async fn table_without_owner_column_is_skipped_and_siblings_proceed() {
    let db = inmem_db().await;
    let conn = raw(&db);
    exec(&conn, "CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT)").await;
    exec(&conn, "INSERT INTO users (id, username) VALUES (1, 'alice')").await;
    // Previous migration failed to add owner_id here.
    exec(&conn, "CREATE TABLE bots (id INTEGER PRIMARY KEY, name TEXT)").await;
    exec(&conn, "CREATE TABLE flows (id INTEGER PRIMARY KEY, owner_id INTEGER)").await;
    exec(&conn, "INSERT INTO flows (id) VALUES (1), (2)").await;

    let report = db.backfill_ownership(&spec()).await.unwrap();
    assert_eq!(report.skipped, vec!["bots".to_owned()]);
    assert!(report.failed.is_empty());
    assert_eq!(report.total_assigned(), 2);
}
