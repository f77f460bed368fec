//! Upstash Redis backend over the REST API

use crate::store::{build_http_client, transport_error, FlagStore};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use types::{ConfigError, FlagValue, Provider, Result, StoreError};

const BACKEND: &str = "upstash";

/// Endpoint and token parsed from an `<endpoint>@<token>` connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstashCredentials {
    pub endpoint: String,
    pub token: String,
}

impl UpstashCredentials {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

impl FromStr for UpstashCredentials {
    type Err = ConfigError;

    /// Splits on the first `@`, so tokens may themselves contain `@`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (endpoint, token) = s.split_once('@').ok_or_else(|| {
            ConfigError::validation(
                "connection_string",
                "Upstash connection string must look like <endpoint>@<token>",
            )
        })?;

        if endpoint.is_empty() || token.is_empty() {
            return Err(ConfigError::validation(
                "connection_string",
                "Upstash connection string has an empty endpoint or token",
            ));
        }

        Ok(Self::new(endpoint.trim_end_matches('/'), token))
    }
}

/// Reply envelope of the Upstash REST API
#[derive(Debug, Deserialize)]
struct UpstashReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for one Upstash database
#[derive(Debug, Clone)]
pub struct UpstashStore {
    credentials: UpstashCredentials,
    http_client: Client,
}

impl UpstashStore {
    /// Create a new Upstash store
    pub fn new(credentials: UpstashCredentials) -> Result<Self> {
        Ok(Self {
            credentials,
            http_client: build_http_client(BACKEND)?,
        })
    }

    pub fn credentials(&self) -> &UpstashCredentials {
        &self.credentials
    }

    /// Run a single Redis command, returning its `result`
    async fn command(&self, args: &[&str]) -> std::result::Result<Value, StoreError> {
        let response = self
            .http_client
            .post(&self.credentials.endpoint)
            .bearer_auth(&self.credentials.token)
            .json(args)
            .send()
            .await
            .map_err(|e| transport_error(BACKEND, e))?;

        let status = response.status();
        let raw_text = response.text().await.map_err(|e| StoreError::InvalidResponse {
            backend: BACKEND.to_string(),
            message: format!("error reading response body: {}", e),
        })?;

        parse_reply(status, &raw_text)
    }
}

/// Turn a raw REST reply into the command result
fn parse_reply(status: reqwest::StatusCode, raw_text: &str) -> std::result::Result<Value, StoreError> {
    let reply = serde_json::from_str::<UpstashReply>(raw_text);

    if let Ok(UpstashReply { error: Some(message), .. }) = &reply {
        return Err(StoreError::Backend {
            backend: BACKEND.to_string(),
            message: message.clone(),
        });
    }

    if !status.is_success() {
        return Err(StoreError::HttpError {
            backend: BACKEND.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    reply
        .map(|r| r.result.unwrap_or(Value::Null))
        .map_err(|e| StoreError::InvalidResponse {
            backend: BACKEND.to_string(),
            message: format!("invalid JSON response: {} | raw: {}", e, raw_text),
        })
}

#[async_trait]
impl FlagStore for UpstashStore {
    async fn get_flag(&self, key: &str) -> Result<FlagValue> {
        tracing::debug!(backend = BACKEND, key = key, "Reading maintenance flag");

        let result = self.command(&["GET", key]).await?;
        let value = FlagValue::from_json(&result).ok_or_else(|| StoreError::InvalidValue {
            backend: BACKEND.to_string(),
            key: key.to_string(),
            value: result.to_string(),
        })?;

        Ok(value)
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        let encoded = if value { "true" } else { "false" };
        tracing::debug!(backend = BACKEND, key = key, value = value, "Writing maintenance flag");

        let result = self.command(&["SET", key, encoded]).await?;
        if result.as_str() != Some("OK") {
            return Err(StoreError::InvalidResponse {
                backend: BACKEND.to_string(),
                message: format!("unexpected SET result: {}", result),
            }
            .into());
        }

        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Upstash
    }
}
