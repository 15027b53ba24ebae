use crate::{Principal, PrincipalId};

/// Request metadata captured at the edge and carried into audit records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    #[must_use]
    pub fn new(client_ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            client_ip,
            user_agent,
        }
    }
}

/// `SecurityContext` binds a resolved principal to the request it arrived with.
///
/// Contexts are only built after the credential has been verified, so holding
/// one means the principal exists and is active.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    principal: Principal,
    meta: RequestMeta,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder for the given principal
    #[must_use]
    pub fn builder(principal: Principal) -> SecurityContextBuilder {
        SecurityContextBuilder {
            principal,
            meta: RequestMeta::default(),
        }
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[inline]
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.principal.username
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.principal.is_superuser
    }

    /// Client IP and user agent of the originating request
    #[must_use]
    pub fn meta(&self) -> &RequestMeta {
        &self.meta
    }
}

pub struct SecurityContextBuilder {
    principal: Principal,
    meta: RequestMeta,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn meta(mut self, meta: RequestMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn client_ip(mut self, client_ip: &str) -> Self {
        self.meta.client_ip = Some(client_ip.to_owned());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.meta.user_agent = Some(user_agent.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            principal: self.principal,
            meta: self.meta,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_carries_principal_and_meta() {
        let ctx = SecurityContext::builder(Principal::new(7, "alice", "alice@example.com"))
            .client_ip("10.0.0.1")
            .user_agent("curl/8.0")
            .build();

        assert_eq!(ctx.principal_id(), 7);
        assert_eq!(ctx.username(), "alice");
        assert!(!ctx.is_superuser());
        assert_eq!(ctx.meta().client_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(ctx.meta().user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn default_meta_is_empty() {
        let ctx = SecurityContext::builder(Principal::new(1, "bob", "bob@example.com")).build();
        assert_eq!(ctx.meta(), &RequestMeta::default());
    }
}
