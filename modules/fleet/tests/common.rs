#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use botfleet_auth::{HmacTokenValidator, ValidationConfig, hmac::mint_hs256};
use botfleet_db::{ConnectOpts, DbHandle};
use botfleet_security::{Principal, SecurityContext};
use fleet::infra::audit::AuditRecorder;
use fleet::{Fleet, ServiceConfig, prepare_store};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const SECRET: &[u8] = b"fleet-test-secret";

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const ROOT: i64 = 3;
pub const CAROL: i64 = 4;

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

pub async fn exec(db: &DbHandle, sql: &str) {
    db.sea()
        .execute_unprepared(sql)
        .await
        .unwrap_or_else(|e| panic!("failed to execute `{sql}`: {e}"));
}

pub async fn scalar_i64(db: &DbHandle, sql: &str) -> i64 {
    let conn = db.sea();
    let row = conn
        .query_one(Statement::from_string(conn.get_database_backend(), sql))
        .await
        .unwrap()
        .expect("query returned no row");
    row.try_get_by_index::<i64>(0).unwrap()
}

/// alice and bob are ordinary, root is a superuser, carol is deactivated.
pub async fn seed_principals(db: &DbHandle) {
    exec(
        db,
        "INSERT INTO users (id, username, email, password_hash, is_active, is_superuser) VALUES \
         (1, 'alice', 'alice@example.com', 'x', 1, 0), \
         (2, 'bob', 'bob@example.com', 'x', 1, 0), \
         (3, 'root', 'root@example.com', 'x', 1, 1), \
         (4, 'carol', 'carol@example.com', 'x', 0, 0)",
    )
    .await;
}

/// Converged empty store with the four principals.
pub async fn prepared_db() -> DbHandle {
    let db = inmem_db().await;
    prepare_store(&db).await.expect("store preparation failed");
    seed_principals(&db).await;
    db
}

pub fn validator() -> Arc<HmacTokenValidator> {
    Arc::new(HmacTokenValidator::new(SECRET, ValidationConfig::default()).unwrap())
}

pub fn fleet(db: &DbHandle) -> Fleet {
    Fleet::new(db, validator(), ServiceConfig::default())
}

pub fn fleet_with_audit(db: &DbHandle, audit: AuditRecorder) -> Fleet {
    Fleet::with_audit(db, validator(), ServiceConfig::default(), audit)
}

pub fn token_for(sub: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + 600;
    mint_hs256(SECRET, &json!({ "sub": sub, "exp": exp })).unwrap()
}

pub fn ctx(id: i64, username: &str) -> SecurityContext {
    SecurityContext::builder(Principal::new(id, username, format!("{username}@example.com")))
        .client_ip("203.0.113.7")
        .build()
}

pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    principal: Option<i64>,
    body: Option<Value>,
) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(id) = principal {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token_for(id)));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_owned());
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        location,
        body,
    }
}

pub async fn create_bot(app: &Router, owner: i64, name: &str) -> i64 {
    let reply = call(
        app,
        "POST",
        "/api/v1/bots",
        Some(owner),
        Some(json!({ "name": name, "platform_token": "123456:ABCDEFGH" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    reply.json()["id"].as_i64().unwrap()
}
