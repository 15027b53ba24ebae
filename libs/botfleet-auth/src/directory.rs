use async_trait::async_trait;
use botfleet_security::{Principal, PrincipalId};
use thiserror::Error;

/// Directory lookups failed for a reason other than "no such principal".
#[derive(Debug, Error)]
#[error("principal directory unavailable: {message}")]
pub struct DirectoryError {
    pub message: String,
}

impl DirectoryError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Read access to registered principals.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// `Ok(None)` when no principal has this id.
    async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, DirectoryError>;
}
