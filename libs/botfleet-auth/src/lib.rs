#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authentication for botfleet.
//!
//! Bearer tokens are verified by a [`TokenValidator`], the subject is looked
//! up through a [`PrincipalDirectory`], and the [`TenantContextResolver`]
//! combines the two into a `SecurityContext`. The `axum-ext` feature wires
//! that into an axum middleware.

pub mod claims;
pub mod claims_error;
pub mod directory;
pub mod errors;
pub mod hmac;
pub mod resolver;
pub mod traits;
pub mod validation;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

pub use claims::Claims;
pub use claims_error::ClaimsError;
pub use directory::{DirectoryError, PrincipalDirectory};
pub use errors::AuthError;
pub use hmac::HmacTokenValidator;
pub use resolver::TenantContextResolver;
pub use traits::TokenValidator;
pub use validation::ValidationConfig;

#[cfg(feature = "axum-ext")]
pub use axum_ext::{AuthRejectionSink, AuthState, Authz, auth_middleware};
