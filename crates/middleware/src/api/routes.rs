//! API route definitions

use crate::api::{handlers, middleware::require_admin_key};
use crate::app::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;

const RESERVED_PATHS: [&str; 3] = ["/", "/healthz", "/admin/maintenance"];

/// Create the application router
pub fn create_routes(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/admin/maintenance", post(handlers::toggle_maintenance))
        .route_layer(from_fn_with_state(state.clone(), require_admin_key));

    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route("/healthz", get(handlers::health_check))
        .merge(admin);

    let slug = state.gate.options().page_slug();
    if RESERVED_PATHS.contains(&slug.as_str()) {
        tracing::warn!(maintenance_page = %slug, "Maintenance page slug collides with a built-in route");
    } else {
        // Rewrites keep the request method, so every method lands here
        router = router.route(&slug, any(handlers::maintenance_page));
    }

    router.with_state(state)
}
