#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, middleware, response::IntoResponse, routing::get};
use botfleet_auth::{
    AuthError, AuthRejectionSink, AuthState, Authz, DirectoryError, HmacTokenValidator,
    PrincipalDirectory, TenantContextResolver, ValidationConfig, auth_middleware,
    hmac::mint_hs256,
};
use botfleet_security::{Principal, PrincipalId, RequestMeta};
use serde_json::json;

pub const SECRET: &[u8] = b"middleware-test-secret";
pub const ISSUER: &str = "botfleet";
pub const AUDIENCE: &str = "botfleet-api";

pub struct StaticDirectory(pub Vec<Principal>);

#[async_trait]
impl PrincipalDirectory for StaticDirectory {
    async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, DirectoryError> {
        Ok(self.0.iter().find(|p| p.id == id).cloned())
    }
}

/// Collects `(client_ip, error code)` for every rejection.
#[derive(Default)]
pub struct RecordingSink(pub Mutex<Vec<(Option<String>, &'static str)>>);

#[async_trait]
impl AuthRejectionSink for RecordingSink {
    async fn on_rejected(&self, meta: &RequestMeta, error: &AuthError) {
        self.0
            .lock()
            .unwrap()
            .push((meta.client_ip.clone(), error.code()));
    }
}

impl RecordingSink {
    pub fn codes(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }
}

pub fn principals() -> Vec<Principal> {
    vec![
        Principal::new(1, "alice", "alice@example.com"),
        Principal::new(2, "bob", "bob@example.com").with_active(false),
    ]
}

pub fn validation() -> ValidationConfig {
    ValidationConfig {
        allowed_issuers: vec![ISSUER.to_owned()],
        allowed_audiences: vec![AUDIENCE.to_owned()],
        ..ValidationConfig::default()
    }
}

pub fn token_with(secret: &[u8], sub: i64, exp_offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
    mint_hs256(
        secret,
        &json!({"sub": sub, "iss": ISSUER, "aud": AUDIENCE, "exp": exp}),
    )
    .unwrap()
}

pub fn token_from_issuer(issuer: &str, sub: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + 600;
    mint_hs256(
        SECRET,
        &json!({"sub": sub, "iss": issuer, "aud": AUDIENCE, "exp": exp}),
    )
    .unwrap()
}

pub fn token_for(sub: i64) -> String {
    token_with(SECRET, sub, 600)
}

async fn whoami(Authz(ctx): Authz) -> impl IntoResponse {
    format!(
        "{}|{}|{}",
        ctx.principal_id(),
        ctx.meta().client_ip.as_deref().unwrap_or("-"),
        ctx.meta().user_agent.as_deref().unwrap_or("-"),
    )
}

pub fn app(sink: Arc<RecordingSink>) -> Router {
    let validator = HmacTokenValidator::new(SECRET, validation()).unwrap();
    let resolver = TenantContextResolver::new(
        Arc::new(validator),
        Arc::new(StaticDirectory(principals())),
    );
    let state = AuthState::new(resolver).with_rejection_sink(sink);

    Router::new()
        .route("/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}
