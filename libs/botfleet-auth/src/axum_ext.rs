//! Axum extractors and middleware for auth

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use botfleet_security::{RequestMeta, SecurityContext};

use crate::{errors::AuthError, resolver::TenantContextResolver};

/// First hop of `X-Forwarded-For` wins over the socket peer address.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Extractor for `SecurityContext` - validates that auth middleware has run
#[derive(Debug, Clone)]
pub struct Authz(pub SecurityContext);

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .map(Authz)
            .ok_or(AuthError::Internal(
                "SecurityContext not found - auth middleware not configured".to_owned(),
            ))
    }
}

/// Notified for every request the middleware turns away.
///
/// Implementations must not fail the request; the rejection response is
/// produced regardless of what the sink does.
#[async_trait]
pub trait AuthRejectionSink: Send + Sync {
    async fn on_rejected(&self, meta: &RequestMeta, error: &AuthError);
}

#[derive(Clone)]
pub struct AuthState {
    resolver: TenantContextResolver,
    rejection_sink: Option<Arc<dyn AuthRejectionSink>>,
}

impl AuthState {
    #[must_use]
    pub fn new(resolver: TenantContextResolver) -> Self {
        Self {
            resolver,
            rejection_sink: None,
        }
    }

    #[must_use]
    pub fn with_rejection_sink(mut self, sink: Arc<dyn AuthRejectionSink>) -> Self {
        self.rejection_sink = Some(sink);
        self
    }
}

/// Authentication middleware for every protected route.
///
/// Resolves the bearer credential into a [`SecurityContext`] and stores it in
/// the request extensions for [`Authz`]. Requests that fail resolution never
/// reach the handler.
pub async fn auth_middleware(
    State(AuthState {
        resolver,
        rejection_sink,
    }): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let meta = request_meta(request.headers(), peer);
    let token = extract_bearer_token(request.headers());

    match resolver.resolve(token, meta.clone()).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(
                target: "security",
                code = err.code(),
                client_ip = meta.client_ip.as_deref().unwrap_or("-"),
                "request rejected"
            );
            if let Some(sink) = rejection_sink {
                sink.on_rejected(&meta, &err).await;
            }
            err.into_response()
        }
    }
}

/// Extract Bearer token from Authorization header
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
}

/// Client IP and user agent of a request.
#[must_use]
pub fn request_meta(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestMeta {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    let client_ip = forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    RequestMeta::new(client_ip, user_agent)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc "));
        assert_eq!(extract_bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn forwarded_for_first_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.2"),
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.5"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        let meta = request_meta(&headers, Some(peer));
        assert_eq!(meta.client_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.5"));
    }

    #[test]
    fn peer_address_is_the_fallback() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        let meta = request_meta(&HeaderMap::new(), Some(peer));
        assert_eq!(meta.client_ip.as_deref(), Some("192.0.2.10"));
        assert_eq!(meta.user_agent, None);

        assert_eq!(request_meta(&HeaderMap::new(), None), RequestMeta::default());
    }
}
