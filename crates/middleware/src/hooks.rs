//! Caller-supplied middleware hooks

use crate::gate::GateOutcome;
use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use config::HookPresence;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Per-request context handed to hooks next to the request head
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    request_id: Uuid,
    received_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            received_at: Utc::now(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `Some` ends the check with that outcome, `None` lets the gate carry on
pub type HookResult = types::Result<Option<GateOutcome>>;

/// A hook run before or after the flag check
#[async_trait]
pub trait MiddlewareHook: Send + Sync {
    async fn call(&self, request: &Parts, ctx: &ExecutionContext) -> HookResult;
}

/// Hook built from an async closure, see [`hook_fn`]
#[derive(Clone)]
pub struct HookFn<F> {
    f: F,
}

/// Turn an async closure over an owned request head into a hook
pub fn hook_fn<F, Fut>(f: F) -> HookFn<F>
where
    F: Fn(Parts, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    HookFn { f }
}

#[async_trait]
impl<F, Fut> MiddlewareHook for HookFn<F>
where
    F: Fn(Parts, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    async fn call(&self, request: &Parts, ctx: &ExecutionContext) -> HookResult {
        (self.f)(request.clone(), ctx.clone()).await
    }
}

/// The optional `beforeCheck` / `afterCheck` pair
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) before_check: Option<Arc<dyn MiddlewareHook>>,
    pub(crate) after_check: Option<Arc<dyn MiddlewareHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs first; `Some` outcome skips the flag lookup entirely
    pub fn before_check(mut self, hook: impl MiddlewareHook + 'static) -> Self {
        self.before_check = Some(Arc::new(hook));
        self
    }

    /// Runs when the site is not in maintenance; `Some` outcome replaces pass-through
    pub fn after_check(mut self, hook: impl MiddlewareHook + 'static) -> Self {
        self.after_check = Some(Arc::new(hook));
        self
    }

    pub fn presence(&self) -> HookPresence {
        HookPresence {
            before_check: self.before_check.is_some(),
            after_check: self.after_check.is_some(),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_check", &self.before_check.is_some())
            .field("after_check", &self.after_check.is_some())
            .finish()
    }
}
