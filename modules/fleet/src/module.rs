use std::sync::Arc;

use axum::Router;
use botfleet_auth::{AuthState, TenantContextResolver, TokenValidator};
use botfleet_db::DbHandle;
use tracing::info;

use crate::api::rest::routes;
use crate::domain::service::{FleetService, ServiceConfig};
use crate::infra::audit::AuditRecorder;
use crate::infra::directory::SeaOrmPrincipalDirectory;

/// Composition root for the fleet module.
///
/// Holds the wired service and the auth state the REST layer needs. Building
/// it performs no I/O; run [`crate::startup::prepare_store`] first.
#[derive(Clone)]
pub struct Fleet {
    service: Arc<FleetService>,
    auth: AuthState,
}

impl Fleet {
    /// Wire the module against `db`, recording audit entries into the store.
    #[must_use]
    pub fn new(db: &DbHandle, validator: Arc<dyn TokenValidator>, config: ServiceConfig) -> Self {
        let audit = AuditRecorder::sea_orm(db.sea());
        Self::with_audit(db, validator, config, audit)
    }

    /// Same as [`Fleet::new`] with a caller-supplied audit recorder.
    #[must_use]
    pub fn with_audit(
        db: &DbHandle,
        validator: Arc<dyn TokenValidator>,
        config: ServiceConfig,
        audit: AuditRecorder,
    ) -> Self {
        info!(
            default_page_size = config.default_page_size,
            max_page_size = config.max_page_size,
            "Initializing fleet module"
        );

        let directory = Arc::new(SeaOrmPrincipalDirectory::new(db.sea()));
        let resolver = TenantContextResolver::new(validator, directory);
        let auth = AuthState::new(resolver).with_rejection_sink(Arc::new(audit.clone()));

        // SecureConn enforces owner scoping on every resource query.
        let service = Arc::new(FleetService::new(db.sea_secure(), audit, config));

        Self { service, auth }
    }

    #[must_use]
    pub fn service(&self) -> Arc<FleetService> {
        Arc::clone(&self.service)
    }

    /// REST routes, authenticated except for `/health`.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(self.service(), self.auth.clone())
    }
}
