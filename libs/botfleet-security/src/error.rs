use crate::PrincipalId;

#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    /// The principal asked for an unrestricted scope without the superuser flag.
    #[error("principal {principal_id} is not allowed to bypass owner scoping")]
    BypassDenied { principal_id: PrincipalId },
}
