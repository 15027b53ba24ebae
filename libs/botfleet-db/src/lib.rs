#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Botfleet database layer.
//!
//! This crate owns everything that touches the relational store directly:
//!
//! - [`DbHandle`]: one process-wide pool (`SQLite` or `PostgreSQL`) acquired at
//!   startup and shared by every component.
//! - [`schema`]: introspection of the live schema, a pure planner that diffs it
//!   against a declared [`schema::SchemaDescriptor`], and an executor that
//!   applies additive, existence-guarded DDL one operation at a time.
//! - [`ownership`]: the one-time backfill that assigns a default owner to
//!   resources created before ownership existed.
//! - [`secure`]: owner-scoped query builders. Application code reads and writes
//!   owned resources only through [`secure::SecureConn`].
//!
//! # Features
//! - `pg`, `sqlite`: enable `SQLx` backends
//! - `insecure-escape`: expose the raw `SeaORM` connection for infrastructure code
//!
//! # Example
//! ```rust,no_run
//! use botfleet_db::{ConnectOpts, DbHandle};
//!
//! # async fn demo() -> botfleet_db::Result<()> {
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let secure = db.sea_secure();
//! # let _ = secure;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(
        unused_imports,
        unused_variables,
        dead_code,
        unreachable_code,
        clippy::unused_async,
    )
)]

pub use sea_orm::ConnectionTrait as DbConnTrait;

pub mod ownership;
pub mod schema;
pub mod secure;

// Internal modules
mod pool_opts;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::path::Path;
use std::time::Duration;

#[cfg(any(feature = "pg", feature = "sqlite"))]
use pool_opts::ApplyPoolOpts;

#[cfg(feature = "pg")]
use sea_orm::sqlx::{PgPool, postgres::PgPoolOptions};
#[cfg(feature = "sqlite")]
use sea_orm::sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use sea_orm::DatabaseConnection;
#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;

use crate::ownership::{BackfillError, BackfillReport, BackfillSpec};
use crate::schema::{IntrospectError, MigrationReport, SchemaDescriptor};

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(any(feature = "pg", feature = "sqlite"))]
    #[error(transparent)]
    Sqlx(#[from] sea_orm::sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Connection options.
/// Covers common sqlx pool knobs; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: Option<bool>,
    /// For `SQLite` file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: None,

            create_sqlite_dirs: true,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
}

/// File name of the development store inside the server home directory.
pub const DEV_SQLITE_FILE: &str = "botfleet.db";

/// DSN of the file-backed development store under `home_dir`.
///
/// Used when no connection string is configured. Not meant for production.
#[must_use]
pub fn dev_sqlite_dsn(home_dir: &Path) -> String {
    let path = home_dir.join(DEV_SQLITE_FILE);
    format!("sqlite://{}?mode=rwc", path.display())
}

impl DbHandle {
    /// Detect engine by DSN.
    ///
    /// Note: we only check scheme prefixes and don't mutate the tail (credentials etc.).
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        // Trim only leading spaces/newlines to be forgiving with env files.
        let s = dsn.trim_start();

        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_dsn(dsn)))
        }
    }

    /// Connect and build handle.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the DSN is invalid.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let o = PgPoolOptions::new().apply(&opts);
                let pool = o.connect(dsn.trim()).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                tracing::debug!(engine = "postgres", "database pool ready");
                Ok(Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.trim().to_owned(),
                    sea,
                })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let dsn = sqlite::prepare_sqlite_dsn(dsn.trim(), opts.create_sqlite_dirs)?;
                let is_memory = sqlite::is_memory_dsn(&dsn);

                let mut o = SqlitePoolOptions::new().apply(&opts);
                if is_memory {
                    // Each connection to `:memory:` is its own database; pin one.
                    o = o
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }
                let o = o.after_connect(move |conn, _meta| {
                    Box::pin(async move {
                        for stmt in sqlite::connection_pragmas(is_memory) {
                            sea_orm::sqlx::query(&stmt).execute(&mut *conn).await?;
                        }
                        Ok(())
                    })
                });

                let pool = o.connect(&dsn).await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
                tracing::debug!(engine = "sqlite", in_memory = is_memory, "database pool ready");

                Ok(Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                    dsn,
                    sea,
                })
            }
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Graceful pool close. (Dropping the pool also closes it; this just makes it explicit.)
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    /// Get the backend.
    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Get the DSN used for this connection, with credentials redacted.
    #[must_use]
    pub fn dsn(&self) -> String {
        redact_dsn(&self.dsn)
    }

    /// Create a secure database connection for owner-scoped operations.
    ///
    /// This is the way application code reaches owned resources.
    #[must_use]
    pub fn sea_secure(&self) -> crate::secure::SecureConn {
        crate::secure::SecureConn::new(self.sea.clone())
    }

    /// **INSECURE**: Get raw `SeaORM` connection (bypasses all scoping).
    ///
    /// Only available with `--features insecure-escape`. Meant for
    /// infrastructure code that has no principal to scope by: the principal
    /// directory, the audit sink and tests.
    #[cfg(feature = "insecure-escape")]
    #[must_use]
    pub fn sea(&self) -> DatabaseConnection {
        tracing::debug!(
            target: "security",
            "DbHandle::sea() called - bypassing secure ORM layer"
        );
        self.sea.clone()
    }

    /// Bring the live schema up to `descriptor` (introspect, plan, execute).
    ///
    /// # Errors
    /// Returns `IntrospectError` when the live schema cannot be read. Failures of
    /// individual operations are reported inside the returned `MigrationReport`.
    pub async fn converge_schema(
        &self,
        descriptor: &SchemaDescriptor,
    ) -> std::result::Result<MigrationReport, IntrospectError> {
        schema::converge(&self.sea, descriptor).await
    }

    /// Assign the default owner to every resource row that has none.
    ///
    /// # Errors
    /// Returns `BackfillError` when the principal table cannot be queried.
    pub async fn backfill_ownership(
        &self,
        spec: &BackfillSpec,
    ) -> std::result::Result<BackfillReport, BackfillError> {
        ownership::backfill_ownership(&self.sea, spec).await
    }
}

/// Replace the password part of a DSN with `***` for logs and errors.
#[must_use]
pub fn redact_dsn(dsn: &str) -> String {
    let Some((scheme, rest)) = dsn.split_once("://") else {
        return dsn.to_owned();
    };
    let Some((userinfo, host)) = rest.split_once('@') else {
        return dsn.to_owned();
    };
    match userinfo.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host}"),
        None => dsn.to_owned(),
    }
}

// ===================== tests =====================
