use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use botfleet_auth::{AuthState, auth_middleware};

use super::handlers;
use crate::domain::FleetService;

/// The full HTTP surface: public `/health` plus the authenticated API.
///
/// Every `/api/v1` route sits behind the auth middleware; handlers receive the
/// resolved context through `Authz`.
#[must_use]
pub fn router(service: Arc<FleetService>, auth: AuthState) -> Router {
    let api = Router::new()
        .route(
            "/api/v1/bots",
            get(handlers::list_bots).post(handlers::create_bot),
        )
        .route(
            "/api/v1/bots/{id}",
            get(handlers::get_bot)
                .patch(handlers::update_bot)
                .delete(handlers::delete_bot),
        )
        .route(
            "/api/v1/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route(
            "/api/v1/leads/{id}",
            get(handlers::get_lead).delete(handlers::delete_lead),
        )
        .route(
            "/api/v1/flows",
            get(handlers::list_flows).post(handlers::create_flow),
        )
        .route(
            "/api/v1/flows/{id}",
            get(handlers::get_flow).delete(handlers::delete_flow),
        )
        .route(
            "/api/v1/tracking-links",
            get(handlers::list_tracking_links).post(handlers::create_tracking_link),
        )
        .route(
            "/api/v1/tracking-links/{id}",
            get(handlers::get_tracking_link).delete(handlers::delete_tracking_link),
        )
        .route("/api/v1/admin/bots", get(handlers::list_all_bots))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(service);

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
}
