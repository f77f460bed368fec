//! Backend-independent flag store contract

use crate::edge_config::{EdgeConfigManagement, EdgeConfigStore};
use crate::upstash::UpstashStore;
use async_trait::async_trait;
use config::ToggleOptions;
use reqwest::Client;
use std::sync::Arc;
use types::{FlagValue, Provider, Result, StoreError};

/// A remote key-value backend holding the maintenance flag
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Read the flag stored under `key`
    async fn get_flag(&self, key: &str) -> Result<FlagValue>;

    /// Write `value` under `key`
    async fn set_flag(&self, key: &str, value: bool) -> Result<()>;

    /// Backend this store talks to
    fn provider(&self) -> Provider;
}

/// Open a store for reading the flag
pub fn open_store(provider: Provider, connection_string: &str) -> Result<Arc<dyn FlagStore>> {
    let store: Arc<dyn FlagStore> = match provider {
        Provider::Upstash => Arc::new(UpstashStore::new(connection_string.parse()?)?),
        Provider::EdgeConfig => Arc::new(EdgeConfigStore::new(connection_string.parse()?)?),
    };
    Ok(store)
}

/// One-shot read of the flag
pub async fn fetch_flag(provider: Provider, connection_string: &str, key: &str) -> Result<FlagValue> {
    open_store(provider, connection_string)?.get_flag(key).await
}

/// One-shot write of the flag.
///
/// Upstash writes go through the same connection string used for reads.
/// Edge Config writes go through the management API and only need the
/// management credentials carried by `options`.
pub async fn write_flag(options: &ToggleOptions, value: bool) -> Result<()> {
    match options.provider {
        Provider::Upstash => {
            let store = UpstashStore::new(options.connection_string.parse()?)?;
            store.set_flag(options.flag_key(), value).await
        }
        Provider::EdgeConfig => {
            let management = EdgeConfigManagement::from_toggle_options(options)?;
            management.update_flag(options.flag_key(), value).await
        }
    }
}

/// HTTP client shared by a store's requests
pub(crate) fn build_http_client(backend: &str) -> std::result::Result<Client, StoreError> {
    Client::builder()
        .user_agent(concat!("maintenance-mode/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StoreError::Transport {
            backend: backend.to_string(),
            message: format!("failed to create HTTP client: {}", e),
        })
}

/// Map a reqwest failure that produced no usable response
pub(crate) fn transport_error(backend: &str, err: reqwest::Error) -> StoreError {
    StoreError::Transport {
        backend: backend.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::MaintenanceError;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_open_store_selects_backend() {
        let upstash = open_store(Provider::Upstash, "https://eu1-cat.upstash.io@token").unwrap();
        assert_eq!(upstash.provider(), Provider::Upstash);

        let edge = open_store(Provider::EdgeConfig, "https://edge-config.vercel.com/ecfg_1?token=t").unwrap();
        assert_eq!(edge.provider(), Provider::EdgeConfig);
    }

    #[test]
    fn test_open_store_rejects_unparseable_connection() {
        let err = open_store(Provider::Upstash, "https://eu1-cat.upstash.io").err().unwrap();
        assert!(matches!(err, MaintenanceError::Configuration(_)));

        let err = open_store(Provider::EdgeConfig, "edge-config").err().unwrap();
        assert!(matches!(err, MaintenanceError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_fetch_flag_reads_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upstash"))
            .and(header("authorization", "Bearer rest-token"))
            .and(body_json(serde_json::json!(["GET", "isInMaintenanceMode"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "false" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let connection_string = format!("{}/upstash@rest-token", mock_server.uri());
        let value = fetch_flag(Provider::Upstash, &connection_string, "isInMaintenanceMode")
            .await
            .unwrap();
        assert_eq!(value, FlagValue::Set(false));
    }

    #[tokio::test]
    async fn test_fetch_flag_rejects_mismatched_connection() {
        let err = fetch_flag(Provider::EdgeConfig, "not a url", "isInMaintenanceMode")
            .await
            .unwrap_err();
        assert!(matches!(err, MaintenanceError::Configuration(_)));
    }
}
