#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "sqlite")]

mod common;

use botfleet_db::secure::{AccessScope, ScopeError, SecureConn};
use botfleet_security::{Principal, SecurityContext};
use common::{exec, inmem_db, raw};
use sea_orm::{ActiveValue::Set, Order, sea_query::Expr};

mod note {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "notes")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub owner_id: Option<i64>,
        pub body: String,
        pub pinned: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl botfleet_db::secure::ScopableEntity for Entity {
        fn resource_col() -> Option<Self::Column> {
            Some(Column::Id)
        }
        fn owner_col() -> Option<Self::Column> {
            Some(Column::OwnerId)
        }
    }
}

fn ctx(id: i64, name: &str) -> SecurityContext {
    SecurityContext::builder(Principal::new(id, name, format!("{name}@example.com"))).build()
}

fn superuser(id: i64) -> SecurityContext {
    SecurityContext::builder(Principal::new(id, "root", "root@example.com").with_superuser(true))
        .build()
}

/// Notes 1..=2 owned by 1, 3 owned by 2, 4 unowned.
async fn seeded() -> SecureConn {
    let db = inmem_db().await;
    let conn = raw(&db);
    exec(
        &conn,
        "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, owner_id INTEGER, \
         body TEXT NOT NULL, pinned BOOLEAN NOT NULL DEFAULT FALSE)",
    )
    .await;
    exec(
        &conn,
        "INSERT INTO notes (owner_id, body) VALUES (1, 'a1'), (1, 'a2'), (2, 'b1'), (NULL, 'orphan')",
    )
    .await;
    db.sea_secure()
}

fn bodies(notes: &[note::Model]) -> Vec<&str> {
    notes.iter().map(|n| n.body.as_str()).collect()
}

#[tokio::test]
async fn list_returns_only_own_rows() {
    let sec = seeded().await;
    let alice = ctx(1, "alice");

    let notes = sec
        .find::<note::Entity>(&AccessScope::owned_by(&alice))
        .order_by(note::Column::Id, Order::Asc)
        .all(sec.conn())
        .await
        .unwrap();
    assert_eq!(bodies(&notes), vec!["a1", "a2"]);
    assert!(notes.iter().all(|n| n.owner_id == Some(1)));

    assert_eq!(
        sec.count::<note::Entity>(&AccessScope::owned_by(&ctx(2, "bob")))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn empty_scope_sees_nothing() {
    let sec = seeded().await;
    let notes = sec
        .find::<note::Entity>(&AccessScope::default())
        .all(sec.conn())
        .await
        .unwrap();
    assert!(notes.is_empty());
}

#[tokio::test]
async fn foreign_and_missing_ids_look_the_same() {
    let sec = seeded().await;
    let bob = AccessScope::owned_by(&ctx(2, "bob"));

    let foreign = sec
        .find_by_id::<note::Entity>(&bob, 1)
        .unwrap()
        .one(sec.conn())
        .await
        .unwrap();
    let missing = sec
        .find_by_id::<note::Entity>(&bob, 999)
        .unwrap()
        .one(sec.conn())
        .await
        .unwrap();
    assert_eq!(foreign, None);
    assert_eq!(missing, None);

    let am = note::ActiveModel {
        body: Set("hijacked".into()),
        ..Default::default()
    };
    assert!(matches!(
        sec.update_by_id::<note::Entity>(&bob, 1, am.clone()).await,
        Err(ScopeError::NotFound)
    ));
    assert!(matches!(
        sec.update_by_id::<note::Entity>(&bob, 999, am).await,
        Err(ScopeError::NotFound)
    ));
    assert!(matches!(
        sec.delete_by_id::<note::Entity>(&bob, 1).await,
        Err(ScopeError::NotFound)
    ));
    assert!(matches!(
        sec.delete_by_id::<note::Entity>(&bob, 999).await,
        Err(ScopeError::NotFound)
    ));

    // Alice's note is intact.
    let alice = AccessScope::owned_by(&ctx(1, "alice"));
    let still = sec
        .find_by_id::<note::Entity>(&alice, 1)
        .unwrap()
        .one(sec.conn())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still.body, "a1");
}

#[tokio::test]
async fn insert_forces_the_callers_owner() {
    let sec = seeded().await;
    let bob = ctx(2, "bob");

    let am = note::ActiveModel {
        id: Set(1),
        owner_id: Set(Some(1)),
        body: Set("sneaky".into()),
        pinned: Set(false),
    };
    let created = sec.insert::<note::Entity>(&bob, am).await.unwrap();
    assert_eq!(created.owner_id, Some(2));
    assert_ne!(created.id, 1);
}

#[tokio::test]
async fn deactivated_principal_cannot_insert() {
    let sec = seeded().await;
    let gone = SecurityContext::builder(
        Principal::new(3, "gone", "gone@example.com").with_active(false),
    )
    .build();
    let am = note::ActiveModel {
        body: Set("late".into()),
        pinned: Set(false),
        ..Default::default()
    };
    assert!(matches!(
        sec.insert::<note::Entity>(&gone, am).await,
        Err(ScopeError::Denied(_))
    ));
}

#[tokio::test]
async fn owner_can_update_but_not_reassign() {
    let sec = seeded().await;
    let alice = AccessScope::owned_by(&ctx(1, "alice"));

    let am = note::ActiveModel {
        owner_id: Set(Some(2)),
        pinned: Set(true),
        ..Default::default()
    };
    let updated = sec.update_by_id::<note::Entity>(&alice, 2, am).await.unwrap();
    assert!(updated.pinned);
    assert_eq!(updated.owner_id, Some(1));
}

#[tokio::test]
async fn owner_can_delete() {
    let sec = seeded().await;
    let alice = AccessScope::owned_by(&ctx(1, "alice"));
    sec.delete_by_id::<note::Entity>(&alice, 2).await.unwrap();
    assert_eq!(sec.count::<note::Entity>(&alice).await.unwrap(), 1);
}

#[tokio::test]
async fn bulk_update_stays_inside_the_scope() {
    let sec = seeded().await;
    let alice = AccessScope::owned_by(&ctx(1, "alice"));
    let result = sec
        .update_many::<note::Entity>(&alice)
        .col_expr(note::Column::Pinned, Expr::value(true))
        .exec(sec.conn())
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 2);
}

#[tokio::test]
async fn superuser_bypass_sees_everything() {
    let sec = seeded().await;

    assert!(AccessScope::superuser_bypass(&ctx(1, "alice")).is_err());

    let all = AccessScope::superuser_bypass(&superuser(9)).unwrap();
    let notes = sec.find::<note::Entity>(&all).all(sec.conn()).await.unwrap();
    assert_eq!(notes.len(), 4);
}
