//! Shared-secret (HS256) token validation.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::Value;

use crate::{
    claims::Claims,
    claims_error::ClaimsError,
    errors::AuthError,
    traits::TokenValidator,
    validation::{ValidationConfig, validate_claims},
};

/// Verifies HS256 tokens signed with the configured secret.
///
/// Signature checking is delegated to `jsonwebtoken`; issuer, audience and
/// time claims are checked by [`validate_claims`] so that leeway and error
/// mapping stay in one place.
pub struct HmacTokenValidator {
    key: DecodingKey,
    validation: Validation,
    config: ValidationConfig,
}

impl std::fmt::Debug for HmacTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HmacTokenValidator {
    /// # Errors
    /// Returns `AuthError::Internal` if `secret` is empty.
    pub fn new(secret: impl AsRef<[u8]>, config: ValidationConfig) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::Internal("JWT secret must not be empty".to_owned()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            key: DecodingKey::from_secret(secret),
            validation,
            config,
        })
    }

    fn decode(&self, token: &str) -> Result<Claims, ClaimsError> {
        let data = jsonwebtoken::decode::<Value>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => ClaimsError::BadSignature,
                ErrorKind::ExpiredSignature => ClaimsError::Expired,
                _ => ClaimsError::Undecodable(e.to_string()),
            },
        )?;
        let claims = Claims::from_json(&data.claims)?;
        validate_claims(&claims, &self.config)?;
        Ok(claims)
    }
}

#[async_trait]
impl TokenValidator for HmacTokenValidator {
    async fn validate_and_parse(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::from(e)
        })
    }
}

/// Sign `claims` with `secret` (HS256). Test support only; the server never
/// issues credentials.
///
/// # Errors
/// Returns the `jsonwebtoken` error if encoding fails.
#[cfg(any(test, feature = "test-support"))]
pub fn mint_hs256(secret: &[u8], claims: &Value) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        claims,
        &jsonwebtoken::EncodingKey::from_secret(secret),
    )
}
