use thiserror::Error;

use crate::errors::AuthError;

/// Why a bearer token was refused.
///
/// The text is for operator logs. Callers only ever see [`AuthError::code`],
/// so nothing here may be echoed into a response. Variants carry what the
/// token claimed, never the configured allow-lists.
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("signature does not verify")]
    BadSignature,

    #[error("token could not be decoded: {0}")]
    Undecodable(String),

    #[error("payload is not a claims object")]
    NotAnObject,

    #[error("claim `{0}` is missing")]
    Missing(&'static str),

    #[error("claim `{field}` is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("issuer {0:?} is not accepted")]
    IssuerRejected(Option<String>),

    #[error("no accepted audience in {0:?}")]
    AudienceRejected(Vec<String>),

    #[error("token expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,
}

impl From<ClaimsError> for AuthError {
    fn from(err: ClaimsError) -> Self {
        match err {
            ClaimsError::Expired => AuthError::TokenExpired,
            other => AuthError::InvalidToken(other),
        }
    }
}
