//! The maintenance gate: validate, pre-hook, resolve flag, branch, post-hook

use crate::hooks::{ExecutionContext, Hooks};
use axum::{http::request::Parts, response::Response};
use config::{ConfigValidator, GateOptions};
use flag_store::{open_store, FlagCache, FlagStore};
use std::fmt;
use std::sync::Arc;
use types::{utils::cache_key, MaintenanceError, Result};

/// What the hosting router should do with a request
#[derive(Debug)]
pub enum GateOutcome {
    /// Hand the request to the application unchanged
    Continue,
    /// Serve the request from this path instead, keeping the query string
    Rewrite(String),
    /// Answer with this response without reaching the application
    Respond(Response),
}

impl GateOutcome {
    pub fn rewrite(path: impl Into<String>) -> Self {
        GateOutcome::Rewrite(path.into())
    }

    pub fn respond(response: impl axum::response::IntoResponse) -> Self {
        GateOutcome::Respond(response.into_response())
    }
}

/// Request gate closing the site while the maintenance flag is set.
///
/// Configuration is fixed at construction. The optional flag cache lives as
/// long as the gate and is shared by every request it handles.
pub struct MaintenanceGate {
    hooks: Hooks,
    connection_string: String,
    options: GateOptions,
    store: Arc<dyn FlagStore>,
    cache: Option<FlagCache>,
    cache_key: String,
}

impl MaintenanceGate {
    /// Create a gate talking to the backend named by `options.provider`.
    ///
    /// Fails when no hook is supplied or the connection string does not fit
    /// the provider.
    pub fn new(hooks: Hooks, connection_string: impl Into<String>, options: GateOptions) -> Result<Self> {
        let connection_string = connection_string.into();
        ConfigValidator::validate_gate(hooks.presence(), &connection_string, &options)?;

        let store = open_store(options.provider, &connection_string)?;
        Ok(Self::assemble(hooks, connection_string, options, store))
    }

    /// Create a gate over an already opened store
    pub fn with_store(
        hooks: Hooks,
        connection_string: impl Into<String>,
        options: GateOptions,
        store: Arc<dyn FlagStore>,
    ) -> Result<Self> {
        let connection_string = connection_string.into();
        ConfigValidator::validate_gate(hooks.presence(), &connection_string, &options)?;

        Ok(Self::assemble(hooks, connection_string, options, store))
    }

    fn assemble(hooks: Hooks, connection_string: String, options: GateOptions, store: Arc<dyn FlagStore>) -> Self {
        let cache = options.cache_ttl().map(FlagCache::new);
        let cache_key = cache_key(options.provider, &connection_string, options.flag_key());

        Self {
            hooks,
            connection_string,
            options,
            store,
            cache,
            cache_key,
        }
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Drop the cached flag so the next request reads the backend
    pub async fn invalidate_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear().await;
        }
    }

    /// Decide what happens to one request.
    ///
    /// `after_check` only runs while the site is open: an active maintenance
    /// rewrite is final.
    pub async fn handle(&self, request: &Parts, ctx: &ExecutionContext) -> Result<GateOutcome> {
        ConfigValidator::validate_gate(self.hooks.presence(), &self.connection_string, &self.options)?;

        if let Some(ref before_check) = self.hooks.before_check {
            if let Some(outcome) = before_check.call(request, ctx).await? {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    path = request.uri.path(),
                    "beforeCheck hook answered, skipping flag lookup"
                );
                return Ok(outcome);
            }
        }

        if self.resolve_flag().await? {
            let slug = self.options.page_slug();
            tracing::info!(
                request_id = %ctx.request_id(),
                path = request.uri.path(),
                maintenance_page = %slug,
                "Maintenance mode active, rewriting request"
            );
            return Ok(GateOutcome::Rewrite(slug));
        }

        if let Some(ref after_check) = self.hooks.after_check {
            if let Some(outcome) = after_check.call(request, ctx).await? {
                return Ok(outcome);
            }
        }

        Ok(GateOutcome::Continue)
    }

    /// Current flag value, from the cache when fresh
    async fn resolve_flag(&self) -> Result<bool> {
        let key = self.options.flag_key();

        let cached = match self.cache {
            Some(ref cache) => cache.get(&self.cache_key).await,
            None => None,
        };

        let value = match cached {
            Some(value) => {
                tracing::debug!(key = key, "Maintenance flag served from cache");
                value
            }
            None => {
                let value = self.store.get_flag(key).await?;
                if let Some(ref cache) = self.cache {
                    cache.set(self.cache_key.clone(), value).await;
                }
                value
            }
        };

        value.as_bool().ok_or_else(|| MaintenanceError::FlagMissing { key: key.to_string() })
    }
}

impl fmt::Debug for MaintenanceGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaintenanceGate")
            .field("provider", &self.options.provider)
            .field("hooks", &self.hooks)
            .field("key", &self.options.flag_key())
            .field("cache_ttl", &self.options.cache_ttl())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::hook_fn;
    use axum::http::{Request, StatusCode};
    use flag_store::MemoryFlagStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::assert_err;
    use types::Provider;

    const CONNECTION: &str = "https://eu1-fine-cat.upstash.io@token";

    fn parts(path: &str) -> Parts {
        Request::builder().uri(path).body(()).unwrap().into_parts().0
    }

    fn pass_hook() -> impl crate::hooks::MiddlewareHook {
        hook_fn(|_: Parts, _: ExecutionContext| async { Ok(None) })
    }

    fn teapot_hook() -> impl crate::hooks::MiddlewareHook {
        hook_fn(|_: Parts, _: ExecutionContext| async {
            Ok(Some(GateOutcome::respond(StatusCode::IM_A_TEAPOT)))
        })
    }

    fn gate(hooks: Hooks, options: GateOptions, store: Arc<MemoryFlagStore>) -> MaintenanceGate {
        MaintenanceGate::with_store(hooks, CONNECTION, options, store).unwrap()
    }

    async fn run(gate: &MaintenanceGate, path: &str) -> Result<GateOutcome> {
        gate.handle(&parts(path), &ExecutionContext::new()).await
    }

    #[test]
    fn test_construction_requires_a_hook() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash));
        for options in [
            GateOptions::new(Provider::Upstash),
            GateOptions::new(Provider::Upstash).with_cache_time(Duration::from_secs(1)),
        ] {
            let err = MaintenanceGate::with_store(Hooks::new(), CONNECTION, options, store.clone()).unwrap_err();
            assert_eq!(err, MaintenanceError::Configuration(config::MISSING_HOOKS.to_string()));
        }

        let err = MaintenanceGate::new(Hooks::new(), CONNECTION, GateOptions::new(Provider::Upstash)).unwrap_err();
        assert!(matches!(err, MaintenanceError::Configuration(_)));
    }

    #[test]
    fn test_construction_rejects_mismatched_connection() {
        let err = MaintenanceGate::new(
            Hooks::new().before_check(pass_hook()),
            CONNECTION,
            GateOptions::new(Provider::EdgeConfig),
        )
        .unwrap_err();
        assert_eq!(err, MaintenanceError::Configuration(config::INVALID_CONNECTION_STRING.to_string()));
    }

    #[tokio::test]
    async fn test_flag_on_rewrites_to_default_slug() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", true));
        let gate = gate(Hooks::new().before_check(pass_hook()), GateOptions::new(Provider::Upstash), store);

        match run(&gate, "/checkout").await.unwrap() {
            GateOutcome::Rewrite(path) => assert_eq!(path, "/maintenance"),
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_flag_on_rewrites_to_configured_slug_and_custom_key() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("siteDown", true));
        let options = GateOptions::new(Provider::Upstash)
            .with_key("siteDown")
            .with_maintenance_page_slug("/be-right-back");
        let gate = gate(Hooks::new().before_check(pass_hook()), options, store);

        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Rewrite(path)) if path == "/be-right-back"));
    }

    #[tokio::test]
    async fn test_flag_off_continues() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));
        let gate = gate(Hooks::new().after_check(pass_hook()), GateOptions::new(Provider::Upstash), store);

        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Continue)));
    }

    #[tokio::test]
    async fn test_after_check_overrides_pass_through() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));
        let gate = gate(Hooks::new().after_check(teapot_hook()), GateOptions::new(Provider::Upstash), store);

        match run(&gate, "/").await.unwrap() {
            GateOutcome::Respond(response) => assert_eq!(response.status(), StatusCode::IM_A_TEAPOT),
            other => panic!("expected hook response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_after_check_skipped_during_maintenance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let after = hook_fn(move |_: Parts, _: ExecutionContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(GateOutcome::Continue))
            }
        });

        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", true));
        let gate = gate(Hooks::new().after_check(after), GateOptions::new(Provider::Upstash), store);

        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Rewrite(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_before_check_short_circuits_lookup() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", true));
        let gate = gate(Hooks::new().before_check(teapot_hook()), GateOptions::new(Provider::Upstash), store.clone());

        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Respond(_))));
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_absent_flag_is_an_error() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash));
        let gate = gate(Hooks::new().after_check(pass_hook()), GateOptions::new(Provider::Upstash), store);

        let err = assert_err!(run(&gate, "/").await);
        assert_eq!(
            err,
            MaintenanceError::FlagMissing {
                key: "isInMaintenanceMode".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash));
        store.fail_with("connection refused").await;
        let gate = gate(Hooks::new().after_check(pass_hook()), GateOptions::new(Provider::Upstash), store);

        let err = assert_err!(run(&gate, "/").await);
        assert_eq!(err, MaintenanceError::Fetch("connection refused".to_string()));
    }

    #[tokio::test]
    async fn test_hook_error_propagates() {
        let failing = hook_fn(|_: Parts, _: ExecutionContext| async { Err(MaintenanceError::hook("session store down")) });
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));
        let gate = gate(Hooks::new().before_check(failing), GateOptions::new(Provider::Upstash), store.clone());

        let err = assert_err!(run(&gate, "/").await);
        assert_eq!(err, MaintenanceError::Hook("session store down".to_string()));
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_without_cache_every_request_reads_backend() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));
        let gate = gate(Hooks::new().before_check(pass_hook()), GateOptions::new(Provider::Upstash), store.clone());

        for _ in 0..3 {
            run(&gate, "/").await.unwrap();
        }
        assert_eq!(store.reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_reads_backend_once_per_ttl() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));
        let options = GateOptions::new(Provider::Upstash).with_cache_time(Duration::from_millis(1_000));
        let gate = gate(Hooks::new().before_check(pass_hook()), options, store.clone());

        run(&gate, "/").await.unwrap();
        tokio::time::advance(Duration::from_millis(400)).await;
        run(&gate, "/about").await.unwrap();
        assert_eq!(store.reads(), 1);

        tokio::time::advance(Duration::from_millis(700)).await;
        run(&gate, "/").await.unwrap();
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_cache_forces_fresh_read() {
        let store = Arc::new(MemoryFlagStore::new(Provider::Upstash).with_flag("isInMaintenanceMode", false));
        let options = GateOptions::new(Provider::Upstash).with_cache_time(Duration::from_secs(60));
        let gate = gate(Hooks::new().before_check(pass_hook()), options, store.clone());

        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Continue)));
        store.set_flag("isInMaintenanceMode", true).await.unwrap();
        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Continue)));

        gate.invalidate_cache().await;
        assert!(matches!(run(&gate, "/").await, Ok(GateOutcome::Rewrite(_))));
        assert_eq!(store.reads(), 2);
    }
}
