//! Provider and flag value types

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key read when no explicit flag key is configured
pub const DEFAULT_FLAG_KEY: &str = "isInMaintenanceMode";

/// Path requests are rewritten to while maintenance mode is on
pub const DEFAULT_MAINTENANCE_PAGE_SLUG: &str = "/maintenance";

/// Remote key-value backend holding the maintenance flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Upstash Redis, addressed as `<endpoint>@<token>`
    #[serde(rename = "upstash")]
    Upstash,
    /// Vercel Edge Config, addressed by its connection string
    #[serde(rename = "edge-config")]
    EdgeConfig,
}

impl Provider {
    /// Wire name of the provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Upstash => "upstash",
            Provider::EdgeConfig => "edge-config",
        }
    }

    /// Substring a connection string for this provider must contain
    pub fn connection_marker(&self) -> &'static str {
        self.as_str()
    }

    /// Crude shape check of a connection string against this provider
    pub fn matches_connection_string(&self, connection_string: &str) -> bool {
        !connection_string.is_empty() && connection_string.contains(self.connection_marker())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upstash" => Ok(Provider::Upstash),
            "edge-config" => Ok(Provider::EdgeConfig),
            other => Err(ConfigError::InvalidValue {
                field: "provider".to_string(),
                value: format!("Unsupported provider: {}", other),
            }),
        }
    }
}

/// Value observed for the flag key in a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue {
    /// The key exists and holds a boolean
    Set(bool),
    /// The key does not exist
    Absent,
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Set(value) => Some(*value),
            FlagValue::Absent => None,
        }
    }

    /// Interpret a JSON value returned by a backend.
    ///
    /// Accepts JSON booleans, `null`, and the strings `"true"`, `"false"`,
    /// `"1"` and `"0"`. Returns `None` for anything else.
    pub fn from_json(value: &serde_json::Value) -> Option<FlagValue> {
        match value {
            serde_json::Value::Null => Some(FlagValue::Absent),
            serde_json::Value::Bool(b) => Some(FlagValue::Set(*b)),
            serde_json::Value::String(s) => match s.trim() {
                "true" | "1" => Some(FlagValue::Set(true)),
                "false" | "0" => Some(FlagValue::Set(false)),
                _ => None,
            },
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(1) => Some(FlagValue::Set(true)),
                Some(0) => Some(FlagValue::Set(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Set(value)
    }
}

impl From<Option<bool>> for FlagValue {
    fn from(value: Option<bool>) -> Self {
        value.map(FlagValue::Set).unwrap_or(FlagValue::Absent)
    }
}
