//! Vercel Edge Config backend
//!
//! Reads go to the Edge Config endpoint named by the connection string.
//! Edge Config has no direct write API, so writes are PATCH requests to the
//! Vercel management API with a separate config id and API token.

use crate::store::{build_http_client, transport_error, FlagStore};
use async_trait::async_trait;
use config::{ToggleOptions, MISSING_MANAGEMENT_CREDENTIALS};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use types::{ConfigError, FlagValue, MaintenanceError, Provider, Result, StoreError};

const BACKEND: &str = "edge-config";
const MANAGEMENT_BACKEND: &str = "edge-config management API";

/// Present on 404s for a missing item, absent when the config itself is unknown
const DIGEST_HEADER: &str = "x-edge-config-digest";

/// Parsed `https://<host>/<edge-config-id>?token=<token>` connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeConfigConnection {
    /// Everything before the config id
    pub base_url: Url,
    pub edge_config_id: String,
    pub token: String,
}

impl EdgeConfigConnection {
    /// URL of a single item read
    pub fn item_url(&self, key: &str) -> std::result::Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidResponse {
                backend: BACKEND.to_string(),
                message: format!("cannot build item URL from {}", self.base_url),
            })?
            .pop_if_empty()
            .extend([self.edge_config_id.as_str(), "item", key]);
        url.set_query(Some("version=1"));
        Ok(url)
    }
}

impl FromStr for EdgeConfigConnection {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |message: &str| ConfigError::validation("connection_string", message.to_string());

        let url = Url::parse(s).map_err(|e| invalid(&format!("Edge Config connection string is not a URL: {}", e)))?;

        let token = url
            .query_pairs()
            .find(|(name, _)| name == "token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| invalid("Edge Config connection string is missing its token"))?;

        let segments: Vec<String> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        let (edge_config_id, prefix) = segments
            .split_last()
            .ok_or_else(|| invalid("Edge Config connection string is missing the config id"))?;

        let mut base_url = url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);
        base_url.set_path(&prefix.join("/"));

        Ok(Self {
            base_url,
            edge_config_id: edge_config_id.clone(),
            token,
        })
    }
}

/// Edge Config read client.
///
/// Writes need management credentials and go through
/// [`EdgeConfigManagement`] instead.
#[derive(Debug, Clone)]
pub struct EdgeConfigStore {
    connection: EdgeConfigConnection,
    http_client: Client,
}

impl EdgeConfigStore {
    pub fn new(connection: EdgeConfigConnection) -> Result<Self> {
        Ok(Self {
            connection,
            http_client: build_http_client(BACKEND)?,
        })
    }

    pub fn connection(&self) -> &EdgeConfigConnection {
        &self.connection
    }
}

#[async_trait]
impl FlagStore for EdgeConfigStore {
    async fn get_flag(&self, key: &str) -> Result<FlagValue> {
        let url = self.connection.item_url(key)?;
        tracing::debug!(backend = BACKEND, key = key, "Reading maintenance flag");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.connection.token)
            .send()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND && response.headers().contains_key(DIGEST_HEADER) {
            return Ok(FlagValue::Absent);
        }
        if !status.is_success() {
            return Err(StoreError::HttpError {
                backend: BACKEND.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let body: Value = response.json().await.map_err(|e| StoreError::InvalidResponse {
            backend: BACKEND.to_string(),
            message: format!("invalid JSON response: {}", e),
        })?;

        // Edge Config stores real JSON, so only booleans and null are meaningful
        match body {
            Value::Bool(value) => Ok(FlagValue::Set(value)),
            Value::Null => Ok(FlagValue::Absent),
            other => Err(StoreError::InvalidValue {
                backend: BACKEND.to_string(),
                key: key.to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }

    async fn set_flag(&self, key: &str, _value: bool) -> Result<()> {
        tracing::warn!(backend = BACKEND, key = key, "Edge Config reads cannot write the flag");
        Err(MaintenanceError::Configuration(MISSING_MANAGEMENT_CREDENTIALS.to_string()))
    }

    fn provider(&self) -> Provider {
        Provider::EdgeConfig
    }
}

/// Body of a management API items update
#[derive(Debug, Serialize)]
struct ItemsPatch<'a> {
    items: Vec<ItemOperation<'a>>,
}

#[derive(Debug, Serialize)]
struct ItemOperation<'a> {
    operation: &'static str,
    key: &'a str,
    value: bool,
}

/// Vercel management API client for Edge Config writes
#[derive(Debug, Clone)]
pub struct EdgeConfigManagement {
    api_url: String,
    edge_config_id: String,
    api_token: String,
    http_client: Client,
}

impl EdgeConfigManagement {
    pub fn new(
        api_url: impl Into<String>,
        edge_config_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            edge_config_id: edge_config_id.into(),
            api_token: api_token.into(),
            http_client: build_http_client(MANAGEMENT_BACKEND)?,
        })
    }

    /// Build from validated toggle options
    pub fn from_toggle_options(options: &ToggleOptions) -> Result<Self> {
        match (
            options.maintenance_edge_config_id.as_deref(),
            options.maintenance_mode_vercel_api_token.as_deref(),
        ) {
            (Some(id), Some(token)) if !id.is_empty() && !token.is_empty() => {
                Self::new(options.management_api_url(), id, token)
            }
            _ => Err(MaintenanceError::Configuration(MISSING_MANAGEMENT_CREDENTIALS.to_string())),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/v1/edge-config/{}/items", self.api_url, self.edge_config_id)
    }

    /// Upsert the flag; anything but HTTP 200 is a failure
    pub async fn update_flag(&self, key: &str, value: bool) -> Result<()> {
        let body = ItemsPatch {
            items: vec![ItemOperation {
                operation: "update",
                key,
                value,
            }],
        };

        tracing::debug!(
            backend = MANAGEMENT_BACKEND,
            edge_config_id = %self.edge_config_id,
            key = key,
            value = value,
            "Writing maintenance flag"
        );

        let response = self
            .http_client
            .patch(self.items_url())
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(MANAGEMENT_BACKEND, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StoreError::HttpError {
                backend: MANAGEMENT_BACKEND.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        Ok(())
    }
}
