use crate::{PrincipalId, SecurityContext, SecurityError};

/// Access scope defining which owners' resources a request can reach.
///
/// An empty scope (no owners, not unrestricted) is a "deny all" scope.
/// The only way to obtain an unrestricted scope is [`AccessScope::superuser_bypass`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AccessScope {
    pub(crate) owner_ids: Vec<PrincipalId>,
    pub(crate) unrestricted: bool,
}

impl AccessScope {
    #[inline]
    #[must_use]
    pub fn owner_ids(&self) -> &[PrincipalId] {
        &self.owner_ids
    }

    /// Returns true if this scope matches nothing.
    /// An empty scope results in a "deny all" condition in queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.unrestricted && self.owner_ids.is_empty()
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    #[must_use]
    pub fn owners_only(owner_ids: Vec<PrincipalId>) -> Self {
        Self {
            owner_ids,
            unrestricted: false,
        }
    }

    #[must_use]
    pub fn owner(owner_id: PrincipalId) -> Self {
        Self::owners_only(vec![owner_id])
    }

    /// The ordinary scope for a request: resources owned by its principal.
    #[must_use]
    pub fn owned_by(ctx: &SecurityContext) -> Self {
        Self::owner(ctx.principal_id())
    }

    /// Unrestricted scope for superusers.
    ///
    /// Every call site that needs to see across owners must ask for this
    /// explicitly; nothing in the storage layer widens a scope on its own.
    ///
    /// # Errors
    /// Returns `SecurityError::BypassDenied` when the principal is not a superuser.
    pub fn superuser_bypass(ctx: &SecurityContext) -> Result<Self, SecurityError> {
        if !ctx.is_superuser() {
            tracing::warn!(
                target: "security",
                principal_id = ctx.principal_id(),
                "superuser bypass refused"
            );
            return Err(SecurityError::BypassDenied {
                principal_id: ctx.principal_id(),
            });
        }

        tracing::warn!(
            target: "security",
            principal_id = ctx.principal_id(),
            username = %ctx.username(),
            "superuser bypass of owner scoping granted"
        );
        Ok(Self {
            owner_ids: vec![],
            unrestricted: true,
        })
    }
}
