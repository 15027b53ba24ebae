//! Fleet module
//!
//! Bots, leads, conversation flows and tracking links, each owned by exactly
//! one principal. Every read and write goes through the owner-scoped
//! [`botfleet_db::secure::SecureConn`]; a resource owned by someone else is
//! indistinguishable from one that does not exist.
//!
//! ## Layout
//!
//! - [`domain`]: the `FleetService` and its error type
//! - [`infra`]: `SeaORM` entities, the schema descriptor, the principal
//!   directory and the audit recorder
//! - [`api`]: REST handlers and routes
//! - [`startup`]: schema convergence and ownership backfill run before serving
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod module;
pub use module::Fleet;

pub mod startup;
pub use startup::{StartupError, StoreSummary, prepare_store};

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

pub use domain::{DomainError, FleetService, ServiceConfig};
