#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Security primitives shared by the storage, auth and domain layers.
//!
//! A [`SecurityContext`] is produced once per request by the tenant context
//! resolver and carries the authenticated [`Principal`]. Data access is then
//! narrowed with an [`AccessScope`] derived from that context.

pub mod access_scope;
pub mod context;
pub mod error;
pub mod principal;

pub use access_scope::AccessScope;
pub use context::{RequestMeta, SecurityContext, SecurityContextBuilder};
pub use error::SecurityError;
pub use principal::{Principal, PrincipalId};
