//! HTTP API server implementation

use crate::api::routes;
use crate::app::AppState;
use anyhow::{Context, Result};
use axum::Router;
use middleware::with_maintenance_mode;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// HTTP API server
pub struct ApiServer {
    app: Router,
    addr: SocketAddr,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
            .parse()
            .context("Invalid server host/port configuration")?;

        let app = build_app(state);

        info!("API server configured for {}", addr);

        Ok(Self { app, addr })
    }

    /// Run the API server until `shutdown` resolves.
    ///
    /// Requests already in flight when the signal fires are allowed to finish.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .context("Failed to bind to server address")?;

        info!("API server listening on {}", self.addr);

        axum::serve(listener, self.app.clone())
            .with_graceful_shutdown(shutdown)
            .await
            .context("API server error")?;

        info!("API server stopped");
        Ok(())
    }
}

/// Routes wrapped by the maintenance gate, then tracing and timeouts.
///
/// The gate sits outside the router so a rewrite is routed to the
/// maintenance page.
pub fn build_app(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let gate = state.gate.clone();

    with_maintenance_mode(routes::create_routes(state), gate)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(timeout))
}
