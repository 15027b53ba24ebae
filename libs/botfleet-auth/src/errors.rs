use thiserror::Error;

use crate::claims_error::ClaimsError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required: missing or invalid token")]
    Unauthenticated,

    /// The claim-level reason is kept as the error source for logs.
    #[error("Invalid token")]
    InvalidToken(#[source] ClaimsError),

    #[error("Token expired")]
    TokenExpired,

    /// The token is valid but its principal is unknown or deactivated.
    #[error("Principal is not active")]
    InactivePrincipal,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this rejection is the client's fault (HTTP 401).
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Stable short code for logs and audit records.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "missing_credential",
            Self::InvalidToken(_) => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::InactivePrincipal => "inactive_principal",
            Self::Internal(_) => "internal",
        }
    }

    /// Response text for a rejected request. Fixed per [`code`](Self::code).
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "authentication required",
            Self::InvalidToken(_) => "invalid token",
            Self::TokenExpired => "token expired",
            Self::InactivePrincipal => "principal is not active",
            Self::Internal(_) => "internal error",
        }
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::response::Json;
        use serde_json::json;

        let status = if self.is_unauthenticated() {
            StatusCode::UNAUTHORIZED
        } else {
            tracing::error!(error = %self, "authentication infrastructure failure");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({
            "error": self.code(),
            "message": self.public_message(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(all(test, feature = "axum-ext"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use http_body_util::BodyExt;

    async fn body_of(err: AuthError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn rejected_issuer_is_not_echoed() {
        let err = AuthError::from(ClaimsError::IssuerRejected(Some("intruder".to_owned())));
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            r#"{"error":"invalid_token","message":"invalid token","status":401}"#
        );
    }

    #[tokio::test]
    async fn internal_detail_is_masked() {
        let (status, body) = body_of(AuthError::Internal("pool timed out on db-7".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("db-7"), "{body}");
    }

    #[test]
    fn expiry_keeps_its_own_code() {
        assert_eq!(AuthError::from(ClaimsError::Expired).code(), "token_expired");
    }
}
