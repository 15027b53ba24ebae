//! Applies [`ConnectOpts`] to the sqlx pool builders of each enabled backend.

use crate::ConnectOpts;

/// Pool builders that accept the shared connection knobs.
pub(crate) trait ApplyPoolOpts {
    #[must_use]
    fn apply(self, opts: &ConnectOpts) -> Self;
}

// Both sqlx builders expose the same setters; the impl is stamped per backend.
macro_rules! impl_apply_pool_opts {
    ($builder:ty) => {
        impl ApplyPoolOpts for $builder {
            fn apply(mut self, opts: &ConnectOpts) -> Self {
                if let Some(n) = opts.max_conns {
                    self = self.max_connections(n);
                }
                if let Some(n) = opts.min_conns {
                    self = self.min_connections(n);
                }
                if let Some(t) = opts.acquire_timeout {
                    self = self.acquire_timeout(t);
                }
                // Unset knobs keep the sqlx defaults.
                if let Some(t) = opts.idle_timeout {
                    self = self.idle_timeout(t);
                }
                if let Some(t) = opts.max_lifetime {
                    self = self.max_lifetime(t);
                }
                if let Some(test) = opts.test_before_acquire {
                    self = self.test_before_acquire(test);
                }
                self
            }
        }
    };
}

#[cfg(feature = "pg")]
impl_apply_pool_opts!(sea_orm::sqlx::postgres::PgPoolOptions);

#[cfg(feature = "sqlite")]
impl_apply_pool_opts!(sea_orm::sqlx::sqlite::SqlitePoolOptions);
