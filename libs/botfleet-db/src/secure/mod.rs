//! Owner-scoped ORM layer.
//!
//! Wraps `SeaORM` builders in typestate types that refuse to execute until an
//! [`AccessScope`] has been folded into the statement.
//!
//! ```rust
//! use botfleet_db::secure::AccessScope;
//!
//! // Empty scope (deny-all)
//! let deny_scope = AccessScope::default();
//! assert!(deny_scope.is_empty());
//!
//! // Resources owned by principal 7
//! let scope = AccessScope::owner(7);
//! assert_eq!(scope.owner_ids(), &[7]);
//! ```
//!
//! # Policy
//!
//! | Scope | Behavior |
//! |-------|----------|
//! | Empty | Deny all (`WHERE false`) |
//! | Owners | Filter by owner column |
//! | Unrestricted (superuser bypass) | No owner predicate |

mod cond;
mod db_ops;
mod entity_traits;
mod error;
mod secure_conn;
mod select;

pub use cond::build_scope_condition;
pub use entity_traits::ScopableEntity;
pub use error::ScopeError;

pub use botfleet_security::{AccessScope, SecurityContext};

pub use secure_conn::SecureConn;

pub use select::{Scoped, SecureEntityExt, SecureSelect, Unscoped};

pub use db_ops::{
    SecureDeleteExt, SecureDeleteMany, SecureUpdateExt, SecureUpdateMany, secure_insert,
};
