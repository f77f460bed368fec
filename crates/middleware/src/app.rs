//! Main application structure and lifecycle management

use crate::api::ApiServer;
use anyhow::{Context, Result};
use axum::http::request::Parts;
use config::Config;
use middleware::{hook_fn, ExecutionContext, GateOutcome, Hooks, MaintenanceGate, MiddlewareHook};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Paths that stay reachable while maintenance mode is on
const ALWAYS_OPEN_PREFIXES: [&str; 2] = ["/healthz", "/admin/"];

/// Main application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub gate: Arc<MaintenanceGate>,
}

/// Main application that coordinates all components
pub struct Application {
    state: Arc<AppState>,
    api_server: ApiServer,
}

impl Application {
    /// Create a new application instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        let hooks = Hooks::new().before_check(exempt_paths_hook(config.gate_options().page_slug()));
        let gate = MaintenanceGate::new(hooks, config.gate.connection_string.clone(), config.gate_options())
            .context("Failed to create maintenance gate")?;
        info!(gate = ?gate, "Maintenance gate configured");

        let state = Arc::new(AppState {
            config,
            gate: Arc::new(gate),
        });

        let api_server = ApiServer::new(state.clone()).context("Failed to create API server")?;

        info!("Application components initialized successfully");

        Ok(Self { state, api_server })
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            "Starting API server on {}:{}",
            self.state.config.server.host, self.state.config.server.port
        );

        self.api_server.run(shutdown).await.context("API server error")?;

        info!("Application shutdown complete");
        Ok(())
    }
}

/// `beforeCheck` hook letting health checks, admin calls and the
/// maintenance page itself skip the flag lookup
pub fn exempt_paths_hook(maintenance_page: String) -> impl MiddlewareHook {
    hook_fn(move |parts: Parts, _ctx: ExecutionContext| {
        let exempt = is_exempt(parts.uri.path(), &maintenance_page);
        async move { Ok(exempt.then_some(GateOutcome::Continue)) }
    })
}

fn is_exempt(path: &str, maintenance_page: &str) -> bool {
    path == maintenance_page || ALWAYS_OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}
