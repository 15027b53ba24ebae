/// Numeric identity of a principal as stored in the `users` table.
pub type PrincipalId = i64;

/// An authenticated owner identity.
///
/// Identity fields never change after registration. Principals are not
/// deleted; they are deactivated through `is_active`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl Principal {
    #[must_use]
    pub fn new(id: PrincipalId, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            is_active: true,
            is_superuser: false,
        }
    }

    #[must_use]
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}
