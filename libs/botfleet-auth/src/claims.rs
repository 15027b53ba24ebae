use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::claims_error::ClaimsError;
use botfleet_security::PrincipalId;

/// Registered claim names consumed by [`Claims::from_json`]; everything else
/// lands in `extras`.
const REGISTERED: &[&str] = &["sub", "iss", "aud", "exp", "nbf", "iat", "username"];

/// Normalized JWT claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the `sub` claim, the principal id in the `users` table.
    pub sub: PrincipalId,

    /// Display name carried by the token; informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Issuer - the `iss` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Audiences - the `aud` claim, normalized to a list.
    #[serde(default)]
    pub audiences: Vec<String>,

    /// Expiration time - the `exp` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Not before time - the `nbf` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Issued At - the `iat` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,

    /// Additional claims
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Claims {
    /// Normalize a decoded JWT payload.
    ///
    /// `sub` may be a JSON number or a numeric string. `aud` may be a string
    /// or an array of strings.
    ///
    /// # Errors
    /// Returns `ClaimsError` if the payload is not an object, `sub` is
    /// missing or not an integer, or a time claim is not a unix timestamp.
    pub fn from_json(payload: &Value) -> Result<Self, ClaimsError> {
        let obj = payload
            .as_object()
            .ok_or(ClaimsError::NotAnObject)?;

        let sub = obj
            .get("sub")
            .ok_or(ClaimsError::Missing("sub"))
            .and_then(parse_subject)?;

        let extras = obj
            .iter()
            .filter(|(k, _)| !REGISTERED.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            sub,
            username: obj.get("username").and_then(Value::as_str).map(ToOwned::to_owned),
            issuer: obj.get("iss").and_then(Value::as_str).map(ToOwned::to_owned),
            audiences: obj.get("aud").map(extract_audiences).unwrap_or_default(),
            expires_at: obj.get("exp").map(|v| parse_timestamp(v, "exp")).transpose()?,
            not_before: obj.get("nbf").map(|v| parse_timestamp(v, "nbf")).transpose()?,
            issued_at: obj.get("iat").map(|v| parse_timestamp(v, "iat")).transpose()?,
            extras,
        })
    }

}

fn parse_subject(value: &Value) -> Result<PrincipalId, ClaimsError> {
    let invalid = || ClaimsError::Invalid {
        field: "sub",
        reason: "must be an integer principal id",
    };
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<PrincipalId>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Parse a timestamp (seconds since epoch).
///
/// # Errors
/// Returns `ClaimsError::Invalid` if the value is not a valid unix timestamp.
pub fn parse_timestamp(value: &Value, field: &'static str) -> Result<DateTime<Utc>, ClaimsError> {
    let invalid = |reason: &'static str| ClaimsError::Invalid { field, reason };
    let ts = value
        .as_i64()
        .ok_or_else(|| invalid("must be a number (unix timestamp)"))?;
    DateTime::from_timestamp(ts, 0).ok_or_else(|| invalid("invalid unix timestamp"))
}

/// Extract audiences from a string or an array of strings.
#[must_use]
pub fn extract_audiences(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}
