//! Layered server configuration.
//!
//! Sources, lowest priority first: built-in defaults, the YAML file given with
//! `--config`, `BOTFLEET__*` environment variables (`__` separates nesting,
//! e.g. `BOTFLEET__DATABASE__DSN`), `DATABASE_URL`, then command-line flags.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use botfleet_auth::ValidationConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use fleet::ServiceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "BOTFLEET__";
pub const DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("HOME is not set; cannot expand {0}")]
    HomeMissing(String),

    #[error("cannot create home directory {}: {source}", path.display())]
    HomeDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub migration: MigrationConfig,
    pub logging: LoggingConfig,
    pub fleet: FleetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Holds the development store. `~` is expanded; created on load.
    pub home_dir: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8087)),
            home_dir: "~/.botfleet".to_owned(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `postgres://...` or `sqlite:...`. Unset means the file store in `home_dir`.
    pub dsn: Option<String>,
    pub max_conns: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            max_conns: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 shared secret. Required to serve.
    pub jwt_secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: None,
            audience: None,
            leeway_seconds: 60,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            allowed_issuers: self.issuer.iter().cloned().collect(),
            allowed_audiences: self.audience.iter().cloned().collect(),
            leeway_seconds: self.leeway_seconds,
            require_expiry: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Refuse to serve when a schema operation or backfill table failed.
    pub halt_on_degraded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    pub max_name_length: usize,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        let defaults = ServiceConfig::default();
        Self {
            max_name_length: defaults.max_name_length,
            default_page_size: defaults.default_page_size,
            max_page_size: defaults.max_page_size,
        }
    }
}

impl FleetConfig {
    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_name_length: self.max_name_length,
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

/// Flags that override every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub dsn: Option<String>,
    pub verbose: u8,
}

impl AppConfig {
    /// Merge defaults, `path`, and the environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if `path` is missing or any source fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let database_url = std::env::var(DATABASE_URL).ok();
        Self::load_from(path, Env::prefixed(ENV_PREFIX).split("__"), database_url)
    }

    fn load_from(
        path: Option<&Path>,
        env: Env,
        database_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(env);
        if let Some(dsn) = database_url.filter(|d| !d.trim().is_empty()) {
            figment = figment.merge(Serialized::default("database.dsn", dsn));
        }
        figment.extract().map_err(|e| ConfigError::from(Box::new(e)))
    }

    /// `-v` info, `-vv` debug, `-vvv` trace.
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(bind) = cli.bind {
            self.server.bind_addr = bind;
        }
        if let Some(dsn) = &cli.dsn {
            self.database.dsn = Some(dsn.clone());
        }
        let level = match cli.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };
        if let Some(level) = level {
            level.clone_into(&mut self.logging.level);
        }
    }

    /// Expand `~` in `server.home_dir`, create the directory and store the
    /// absolute path back.
    ///
    /// # Errors
    /// Returns `ConfigError` if HOME is unknown or the directory cannot be created.
    pub fn resolve_home_dir(&mut self) -> Result<PathBuf, ConfigError> {
        let path = expand_tilde(&self.server.home_dir)?;
        std::fs::create_dir_all(&path).map_err(|source| ConfigError::HomeDir {
            path: path.clone(),
            source,
        })?;
        self.server.home_dir = path.display().to_string();
        Ok(path)
    }

    /// Checks that need no I/O. The JWT secret is only required to serve.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending setting.
    pub fn validate(&self, serving: bool) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_owned()));
        if self.database.max_conns == 0 {
            return invalid("database.max_conns must be at least 1");
        }
        if self.fleet.default_page_size == 0
            || self.fleet.default_page_size > self.fleet.max_page_size
        {
            return invalid("fleet.default_page_size must be between 1 and fleet.max_page_size");
        }
        if self.fleet.max_name_length == 0 {
            return invalid("fleet.max_name_length must be at least 1");
        }
        if self.auth.leeway_seconds < 0 {
            return invalid("auth.leeway_seconds must not be negative");
        }
        if serving
            && self
                .auth
                .jwt_secret
                .as_deref()
                .is_none_or(|s| s.trim().is_empty())
        {
            return invalid("auth.jwt_secret is required (BOTFLEET__AUTH__JWT_SECRET)");
        }
        Ok(())
    }

    /// Pretty JSON with the secret and DSN password masked.
    ///
    /// # Errors
    /// Returns the serializer error.
    pub fn to_redacted_json(&self) -> Result<String, serde_json::Error> {
        let mut shown = self.clone();
        if shown.auth.jwt_secret.is_some() {
            shown.auth.jwt_secret = Some("***".to_owned());
        }
        shown.database.dsn = shown.database.dsn.as_deref().map(botfleet_db::redact_dsn);
        serde_json::to_string_pretty(&shown)
    }
}

fn expand_tilde(raw: &str) -> Result<PathBuf, ConfigError> {
    let home = || dirs::home_dir().ok_or_else(|| ConfigError::HomeMissing(raw.to_owned()));
    if raw == "~" {
        home()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        Ok(home()?.join(rest))
    } else {
        Ok(PathBuf::from(raw))
    }
}
