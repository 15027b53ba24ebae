//! Domain layer.
//!
//! The domain layer:
//! - **MAY** import: `infra` (data access), the `botfleet-*` libs
//! - **MUST NOT** import: `api::*` (one-way dependency: API -> Domain)

pub mod error;
pub mod model;
pub mod service;

pub use error::DomainError;
pub use service::{FleetService, ServiceConfig};
