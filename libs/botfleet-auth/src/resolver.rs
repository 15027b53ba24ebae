//! Tenant context resolution: credential in, [`SecurityContext`] out.

use std::sync::Arc;

use botfleet_security::{RequestMeta, SecurityContext};

use crate::{directory::PrincipalDirectory, errors::AuthError, traits::TokenValidator};

/// Turns a bearer credential into the authenticated principal's context.
///
/// The resolver only verifies credentials; it never issues them.
#[derive(Clone)]
pub struct TenantContextResolver {
    validator: Arc<dyn TokenValidator>,
    directory: Arc<dyn PrincipalDirectory>,
}

impl TenantContextResolver {
    #[must_use]
    pub fn new(validator: Arc<dyn TokenValidator>, directory: Arc<dyn PrincipalDirectory>) -> Self {
        Self {
            validator,
            directory,
        }
    }

    /// Resolve the principal behind `credential`.
    ///
    /// # Errors
    /// - `AuthError::Unauthenticated` when no credential is supplied.
    /// - `AuthError::InvalidToken` / `AuthError::TokenExpired` when the token
    ///   does not verify.
    /// - `AuthError::InactivePrincipal` when the subject is unknown or deactivated.
    /// - `AuthError::Internal` when the directory cannot be queried.
    pub async fn resolve(
        &self,
        credential: Option<&str>,
        meta: RequestMeta,
    ) -> Result<SecurityContext, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        let claims = self.validator.validate_and_parse(token).await?;

        let principal = self
            .directory
            .find_principal(claims.sub)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let principal = match principal {
            Some(p) if p.is_active => p,
            Some(p) => {
                tracing::info!(
                    target: "security",
                    principal_id = p.id,
                    "rejected token of deactivated principal"
                );
                return Err(AuthError::InactivePrincipal);
            }
            None => {
                tracing::info!(
                    target: "security",
                    principal_id = claims.sub,
                    "rejected token of unknown principal"
                );
                return Err(AuthError::InactivePrincipal);
            }
        };

        Ok(SecurityContext::builder(principal).meta(meta).build())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        directory::DirectoryError,
        hmac::{HmacTokenValidator, mint_hs256},
        validation::ValidationConfig,
    };
    use async_trait::async_trait;
    use botfleet_security::{Principal, PrincipalId};
    use serde_json::json;

    const SECRET: &[u8] = b"resolver-secret";

    struct Fixed(Vec<Principal>);

    #[async_trait]
    impl PrincipalDirectory for Fixed {
        async fn find_principal(
            &self,
            id: PrincipalId,
        ) -> Result<Option<Principal>, DirectoryError> {
            Ok(self.0.iter().find(|p| p.id == id).cloned())
        }
    }

    struct Down;

    #[async_trait]
    impl PrincipalDirectory for Down {
        async fn find_principal(&self, _: PrincipalId) -> Result<Option<Principal>, DirectoryError> {
            Err(DirectoryError::new("connection refused"))
        }
    }

    fn resolver(directory: Arc<dyn PrincipalDirectory>) -> TenantContextResolver {
        let validator = HmacTokenValidator::new(SECRET, ValidationConfig::default()).unwrap();
        TenantContextResolver::new(Arc::new(validator), directory)
    }

    fn token(sub: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + 600;
        mint_hs256(SECRET, &json!({"sub": sub, "exp": exp})).unwrap()
    }

    fn people() -> Arc<dyn PrincipalDirectory> {
        Arc::new(Fixed(vec![
            Principal::new(1, "alice", "alice@example.com"),
            Principal::new(2, "bob", "bob@example.com").with_active(false),
        ]))
    }

    #[tokio::test]
    async fn active_principal_resolves_with_meta() {
        let meta = RequestMeta::new(Some("10.0.0.1".into()), Some("curl/8".into()));
        let ctx = resolver(people())
            .resolve(Some(&token(1)), meta.clone())
            .await
            .unwrap();
        assert_eq!(ctx.principal_id(), 1);
        assert_eq!(ctx.username(), "alice");
        assert_eq!(ctx.meta(), &meta);
    }

    #[tokio::test]
    async fn missing_credential_is_unauthenticated() {
        let r = resolver(people());
        assert!(matches!(
            r.resolve(None, RequestMeta::default()).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            r.resolve(Some("  "), RequestMeta::default()).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn deactivated_and_unknown_principals_are_rejected() {
        let r = resolver(people());
        for sub in [2, 99] {
            let err = r
                .resolve(Some(&token(sub)), RequestMeta::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InactivePrincipal), "sub {sub}");
            assert!(err.is_unauthenticated());
        }
    }

    #[tokio::test]
    async fn directory_outage_is_internal() {
        let err = resolver(Arc::new(Down))
            .resolve(Some(&token(1)), RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        assert!(!err.is_unauthenticated());
    }
}
