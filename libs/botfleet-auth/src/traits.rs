use crate::{claims::Claims, errors::AuthError};
use async_trait::async_trait;

/// Validates and parses bearer tokens
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a token and return normalized claims
    async fn validate_and_parse(&self, token: &str) -> Result<Claims, AuthError>;
}
