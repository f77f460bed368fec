//! Maintenance mode gate for axum applications
//!
//! A [`MaintenanceGate`] reads a boolean flag from Upstash Redis or Vercel
//! Edge Config and, while the flag is on, rewrites every request to the
//! maintenance page. Otherwise it defers to caller-supplied hooks.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use config::GateOptions;
//! use middleware::{hook_fn, with_maintenance_mode, GateOutcome, Hooks, MaintenanceGate};
//! use std::sync::Arc;
//! use types::Provider;
//!
//! # fn build() -> types::Result<Router> {
//! let hooks = Hooks::new().before_check(hook_fn(|parts: axum::http::request::Parts, _ctx| async move {
//!     Ok(parts.uri.path().starts_with("/healthz").then_some(GateOutcome::Continue))
//! }));
//! let gate = MaintenanceGate::new(
//!     hooks,
//!     "https://eu1-fine-cat.upstash.io@AX1token",
//!     GateOptions::new(Provider::Upstash),
//! )?;
//!
//! let app = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .route("/maintenance", get(|| async { "back soon" }));
//! Ok(with_maintenance_mode(app, Arc::new(gate)))
//! # }
//! ```

pub mod gate;
pub mod hooks;
pub mod layer;

pub use gate::{GateOutcome, MaintenanceGate};
pub use hooks::{hook_fn, ExecutionContext, HookFn, HookResult, Hooks, MiddlewareHook};
pub use layer::{error_response, maintenance_mode, rewrite_uri, with_maintenance_mode};
