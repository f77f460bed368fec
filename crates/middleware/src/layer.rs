//! axum integration for the maintenance gate

use crate::gate::{GateOutcome, MaintenanceGate};
use crate::hooks::ExecutionContext;
use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::Layer;
use types::MaintenanceError;

/// Gate every request of `router`.
///
/// The middleware wraps the whole router rather than being added with
/// `Router::layer`, because layered middleware runs after routing and a
/// rewritten URI would never reach the maintenance page route.
pub fn with_maintenance_mode(router: Router, gate: Arc<MaintenanceGate>) -> Router {
    let gated = axum::middleware::from_fn_with_state(gate, maintenance_mode).layer(router);
    Router::new().fallback_service(gated)
}

/// Middleware function applying a gate decision to the request
pub async fn maintenance_mode(
    State(gate): State<Arc<MaintenanceGate>>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = ExecutionContext::new();
    let (mut parts, body) = request.into_parts();

    let outcome = match gate.handle(&parts, &ctx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(
                request_id = %ctx.request_id(),
                path = parts.uri.path(),
                error = %e,
                "Maintenance check failed"
            );
            return error_response(&e);
        }
    };

    match outcome {
        GateOutcome::Continue => {}
        GateOutcome::Rewrite(path) => match rewrite_uri(&parts.uri, &path) {
            Ok(uri) => parts.uri = uri,
            Err(e) => return error_response(&e),
        },
        GateOutcome::Respond(response) => return response,
    }

    parts.extensions.insert(ctx);
    next.run(Request::from_parts(parts, body)).await
}

/// Replace the path of `uri`, keeping its query string
pub fn rewrite_uri(uri: &Uri, path: &str) -> Result<Uri, MaintenanceError> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(
        path_and_query
            .parse()
            .map_err(|e| MaintenanceError::Configuration(format!("Invalid maintenance page slug {}: {}", path, e)))?,
    );

    Uri::from_parts(uri_parts)
        .map_err(|e| MaintenanceError::Configuration(format!("Cannot rewrite request URI to {}: {}", path, e)))
}

/// JSON error body returned when the gate cannot decide
pub fn error_response(err: &MaintenanceError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{hook_fn, Hooks};
    use axum::{body::Body, extract::Extension, http::request::Parts, routing::get};
    use config::GateOptions;
    use flag_store::MemoryFlagStore;
    use tower::util::ServiceExt;
    use types::Provider;

    fn app(store: Arc<MemoryFlagStore>, hooks: Hooks) -> Router {
        let gate = MaintenanceGate::with_store(
            hooks,
            "https://eu1-fine-cat.upstash.io@token",
            GateOptions::new(Provider::Upstash),
            store,
        )
        .unwrap();

        let router = Router::new()
            .route("/dashboard", get(|| async { "dashboard" }))
            .route("/maintenance", get(|uri: Uri| async move { format!("maintenance {}", uri) }))
            .route(
                "/whoami",
                get(|Extension(ctx): Extension<ExecutionContext>| async move { ctx.request_id().to_string() }),
            );

        with_maintenance_mode(router, Arc::new(gate))
    }

    fn pass() -> Hooks {
        Hooks::new().before_check(hook_fn(|_: Parts, _: ExecutionContext| async { Ok(None) }))
    }

    async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_rewrite_uri_keeps_query() {
        let uri: Uri = "/shop/cart?coupon=SPRING".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "/maintenance").unwrap(), "/maintenance?coupon=SPRING");

        let uri: Uri = "https://example.com/shop".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "/maintenance").unwrap(), "https://example.com/maintenance");
    }

    #[tokio::test]
    async fn test_maintenance_serves_maintenance_page() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", true));

        let (status, body) = get_text(app(store, pass()), "/dashboard?tab=billing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "maintenance /maintenance?tab=billing");
    }

    #[tokio::test]
    async fn test_open_site_reaches_application() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));

        let (status, body) = get_text(app(store, pass()), "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "dashboard");
    }

    #[tokio::test]
    async fn test_execution_context_reaches_handlers() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));

        let (status, body) = get_text(app(store, pass()), "/whoami").await;
        assert_eq!(status, StatusCode::OK);
        assert!(uuid::Uuid::parse_str(&body).is_ok());
    }

    #[tokio::test]
    async fn test_missing_flag_is_server_error() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash));

        let (status, body) = get_text(app(store, pass()), "/dashboard").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Maintenance mode key is not found"));
    }

    #[tokio::test]
    async fn test_hook_response_is_returned() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", true));
        let hooks = Hooks::new().before_check(hook_fn(|_: Parts, _: ExecutionContext| async {
            Ok(Some(GateOutcome::respond((StatusCode::UNAUTHORIZED, "sign in first"))))
        }));

        let (status, body) = get_text(app(store.clone(), hooks), "/dashboard").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "sign in first");
        assert_eq!(store.reads(), 0);
    }
}
