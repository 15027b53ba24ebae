//! `SQLite` DSN preparation and per-connection pragmas.

use std::path::Path;

use crate::{DbError, Result};

/// True for DSNs that open a private in-memory database.
pub(crate) fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Strip the scheme and query string, leaving the file path.
fn file_path(dsn: &str) -> &str {
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);
    rest.split_once('?').map_or(rest, |(path, _)| path)
}

/// Normalise a `SQLite` DSN before handing it to sqlx.
///
/// For file stores the parent directory is created (when `create_dirs` is set)
/// and `mode=rwc` is appended so a missing file is created on first connect.
pub(crate) fn prepare_sqlite_dsn(dsn: &str, create_dirs: bool) -> Result<String> {
    if is_memory_dsn(dsn) {
        return Ok(dsn.to_owned());
    }

    let path = file_path(dsn);
    if path.is_empty() {
        return Err(DbError::InvalidConfig(format!(
            "SQLite DSN has no file path: {dsn}"
        )));
    }

    if create_dirs
        && let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
        tracing::debug!(dir = %parent.display(), "ensured SQLite parent directory");
    }

    if dsn.contains("mode=") {
        Ok(dsn.to_owned())
    } else if dsn.contains('?') {
        Ok(format!("{dsn}&mode=rwc"))
    } else {
        Ok(format!("{dsn}?mode=rwc"))
    }
}

/// Pragmas run on every new pooled connection.
pub(crate) fn connection_pragmas(is_memory: bool) -> Vec<String> {
    let journal_mode = if is_memory { "DELETE" } else { "WAL" };
    let mut pragmas = vec![
        format!("PRAGMA journal_mode = {journal_mode}"),
        "PRAGMA synchronous = NORMAL".to_owned(),
        "PRAGMA foreign_keys = ON".to_owned(),
    ];
    if !is_memory {
        pragmas.push("PRAGMA busy_timeout = 5000".to_owned());
    }
    pragmas
}
