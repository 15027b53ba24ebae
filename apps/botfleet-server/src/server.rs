use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum::Router;
use axum::http::StatusCode;
use botfleet_auth::HmacTokenValidator;
use botfleet_db::{ConnectOpts, DbHandle, dev_sqlite_dsn, redact_dsn};
use fleet::{Fleet, StoreSummary, prepare_store};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Open the pool. With no DSN configured the development file store under
/// `home_dir` is used.
///
/// # Errors
/// Fails when the store is unreachable; the server cannot start without it.
pub async fn connect(cfg: &AppConfig, home_dir: &Path) -> Result<DbHandle> {
    let dsn = if let Some(dsn) = &cfg.database.dsn {
        dsn.clone()
    } else {
        let dsn = dev_sqlite_dsn(home_dir);
        tracing::warn!(
            dsn = %dsn,
            "database.dsn is not set; using the development SQLite store"
        );
        dsn
    };

    let opts = ConnectOpts {
        max_conns: Some(cfg.database.max_conns),
        acquire_timeout: Some(cfg.database.acquire_timeout),
        ..ConnectOpts::default()
    };
    let db = DbHandle::connect(&dsn, opts)
        .await
        .with_context(|| format!("store unavailable: {}", redact_dsn(&dsn)))?;
    tracing::info!(engine = ?db.engine(), dsn = %db.dsn(), "connected to store");
    Ok(db)
}

/// Converge the schema and backfill ownership, honoring `halt_on_degraded`.
///
/// # Errors
/// Fails when the store cannot be read, or when the run is degraded and the
/// configuration says to halt.
pub async fn prepare(db: &DbHandle, cfg: &AppConfig) -> Result<StoreSummary> {
    let summary = prepare_store(db).await.context("store unavailable")?;
    if summary.is_degraded() {
        if cfg.migration.halt_on_degraded {
            bail!("store preparation degraded ({summary}); refusing to serve");
        }
        tracing::warn!(summary = %summary, "store preparation degraded; continuing");
    }
    Ok(summary)
}

/// Fleet routes plus the outer HTTP stack.
///
/// Request flow, outermost first: request id, trace, timeout, fleet routes.
///
/// # Errors
/// Fails when the auth configuration is unusable.
pub fn build_router(db: &DbHandle, cfg: &AppConfig) -> Result<Router> {
    let secret = cfg.auth.jwt_secret.as_deref().unwrap_or_default();
    let validator = HmacTokenValidator::new(secret, cfg.auth.validation())
        .context("invalid auth configuration")?;

    let fleet = Fleet::new(db, Arc::new(validator), cfg.fleet.service_config());

    let stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            cfg.server.request_timeout,
        ));

    Ok(fleet.router().layer(stack))
}

/// Bind and serve until Ctrl-C or SIGTERM.
///
/// # Errors
/// Fails when the listener cannot be bound or the server errors.
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("HTTP server shutting down gracefully");
}
