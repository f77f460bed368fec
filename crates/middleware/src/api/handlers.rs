//! HTTP API request handlers

use crate::app::AppState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use types::MaintenanceError;

const MAINTENANCE_PAGE: &str = "<!doctype html>
<html>
  <head><title>Down for maintenance</title></head>
  <body>
    <h1>We'll be back soon</h1>
    <p>The site is undergoing scheduled maintenance. Please check back shortly.</p>
  </body>
</html>
";

/// Body of `POST /admin/maintenance`
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub active: bool,
}

/// Landing page served while the site is open
pub async fn home() -> Json<Value> {
    Json(json!({
        "service": "maintenance-mode",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Site is open"
    }))
}

/// Page every request is rewritten to while maintenance mode is on
pub async fn maintenance_page(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !query.is_empty() {
        tracing::debug!(params = query.len(), "Serving maintenance page for request with query string");
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, "120")],
        Html(MAINTENANCE_PAGE),
    )
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "provider": state.gate.options().provider,
        "maintenance_page": state.gate.options().page_slug()
    }))
}

/// Switch maintenance mode on or off and drop the gate's cached flag
pub async fn toggle_maintenance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let options = state.config.toggle_options();

    flag_store::set_status(request.active, &options)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, active = request.active, "Failed to update maintenance status");
            (error_status(&e), Json(json!({ "error": e.to_string() })))
        })?;

    state.gate.invalidate_cache().await;

    Ok(Json(json!({
        "active": request.active,
        "key": options.flag_key(),
        "provider": options.provider,
        "message": if request.active {
            "Maintenance mode enabled"
        } else {
            "Maintenance mode disabled"
        }
    })))
}

fn error_status(error: &MaintenanceError) -> StatusCode {
    match error {
        MaintenanceError::Fetch(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
