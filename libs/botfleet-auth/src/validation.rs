use chrono::{Duration, Utc};

use crate::{claims::Claims, claims_error::ClaimsError};

/// Configuration for common validation
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Allowed issuers (if empty, any issuer is accepted)
    pub allowed_issuers: Vec<String>,

    /// Allowed audiences (if empty, any audience is accepted)
    pub allowed_audiences: Vec<String>,

    /// Leeway in seconds for time-based validations (exp, nbf)
    pub leeway_seconds: i64,

    /// Reject tokens without `exp`.
    pub require_expiry: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_issuers: vec![],
            allowed_audiences: vec![],
            leeway_seconds: 60,
            require_expiry: true,
        }
    }
}

/// Perform common validation checks on claims.
///
/// # Errors
/// Returns `ClaimsError` if any validation check fails (issuer, audience, expiration, etc.).
pub fn validate_claims(claims: &Claims, config: &ValidationConfig) -> Result<(), ClaimsError> {
    if !config.allowed_issuers.is_empty()
        && !claims
            .issuer
            .as_ref()
            .is_some_and(|iss| config.allowed_issuers.contains(iss))
    {
        return Err(ClaimsError::IssuerRejected(claims.issuer.clone()));
    }

    // At least one audience must match
    if !config.allowed_audiences.is_empty()
        && !claims
            .audiences
            .iter()
            .any(|aud| config.allowed_audiences.contains(aud))
    {
        return Err(ClaimsError::AudienceRejected(claims.audiences.clone()));
    }

    let now = Utc::now();
    let leeway = Duration::seconds(config.leeway_seconds);

    match claims.expires_at {
        Some(exp) if now > exp + leeway => return Err(ClaimsError::Expired),
        None if config.require_expiry => {
            return Err(ClaimsError::Missing("exp"));
        }
        _ => {}
    }

    if let Some(nbf) = claims.not_before
        && now < nbf - leeway
    {
        return Err(ClaimsError::NotYetValid);
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::Map;

    fn claims() -> Claims {
        Claims {
            sub: 1,
            username: None,
            issuer: Some("botfleet".to_owned()),
            audiences: vec!["botfleet-api".to_owned()],
            expires_at: Some(Utc::now() + Duration::hours(1)),
            not_before: None,
            issued_at: None,
            extras: Map::new(),
        }
    }

    fn strict() -> ValidationConfig {
        ValidationConfig {
            allowed_issuers: vec!["botfleet".to_owned()],
            allowed_audiences: vec!["botfleet-api".to_owned()],
            ..ValidationConfig::default()
        }
    }

    #[test]
    fn valid_claims_pass() {
        assert!(validate_claims(&claims(), &strict()).is_ok());
    }

    #[test]
    fn wrong_or_missing_issuer_fails() {
        let mut c = claims();
        c.issuer = Some("someone-else".to_owned());
        assert!(matches!(
            validate_claims(&c, &strict()),
            Err(ClaimsError::IssuerRejected(_))
        ));
        c.issuer = None;
        assert!(matches!(
            validate_claims(&c, &strict()),
            Err(ClaimsError::IssuerRejected(_))
        ));
    }

    #[test]
    fn audience_must_intersect() {
        let mut c = claims();
        c.audiences = vec!["other".to_owned()];
        assert!(matches!(
            validate_claims(&c, &strict()),
            Err(ClaimsError::AudienceRejected(_))
        ));
    }

    #[test]
    fn expiry_respects_leeway() {
        let mut c = claims();
        c.expires_at = Some(Utc::now() - Duration::seconds(30));
        assert!(validate_claims(&c, &strict()).is_ok(), "inside 60s leeway");

        c.expires_at = Some(Utc::now() - Duration::seconds(120));
        assert!(matches!(
            validate_claims(&c, &strict()),
            Err(ClaimsError::Expired)
        ));
    }

    #[test]
    fn missing_expiry_is_rejected_by_default() {
        let mut c = claims();
        c.expires_at = None;
        assert!(matches!(
            validate_claims(&c, &strict()),
            Err(ClaimsError::Missing("exp"))
        ));
    }

    #[test]
    fn not_before_in_the_future_fails() {
        let mut c = claims();
        c.not_before = Some(Utc::now() + Duration::minutes(10));
        assert!(matches!(
            validate_claims(&c, &strict()),
            Err(ClaimsError::NotYetValid)
        ));
    }
}
