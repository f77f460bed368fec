//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::{utils::normalize_slug, Provider, DEFAULT_FLAG_KEY, DEFAULT_MAINTENANCE_PAGE_SLUG};

/// Management API used for Edge Config writes
pub const DEFAULT_MANAGEMENT_API_URL: &str = "https://api.vercel.com";

/// Options supplied when constructing a maintenance gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOptions {
    /// Backend holding the flag
    pub provider: Provider,
    /// Path requests are rewritten to while maintenance is on
    #[serde(default)]
    pub maintenance_page_slug: Option<String>,
    /// Flag key inside the backend
    #[serde(default)]
    pub key: Option<String>,
    /// Flag cache lifetime in milliseconds; unset or zero disables caching
    #[serde(default)]
    pub cache_time_ms: Option<u64>,
}

impl GateOptions {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            maintenance_page_slug: None,
            key: None,
            cache_time_ms: None,
        }
    }

    pub fn with_maintenance_page_slug(mut self, slug: impl Into<String>) -> Self {
        self.maintenance_page_slug = Some(slug.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time_ms = Some(u64::try_from(cache_time.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Flag key, falling back to `isInMaintenanceMode`
    pub fn flag_key(&self) -> &str {
        self.key.as_deref().unwrap_or(DEFAULT_FLAG_KEY)
    }

    /// Absolute maintenance page path, falling back to `/maintenance`
    pub fn page_slug(&self) -> String {
        normalize_slug(
            self.maintenance_page_slug
                .as_deref()
                .unwrap_or(DEFAULT_MAINTENANCE_PAGE_SLUG),
        )
    }

    /// Cache lifetime, `None` when caching is disabled
    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_time_ms {
            Some(0) | None => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// Options for flipping the flag from outside the request path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOptions {
    /// Backend holding the flag
    pub provider: Provider,
    /// Same connection string the gate reads with
    pub connection_string: String,
    /// Flag key inside the backend
    #[serde(default)]
    pub key: Option<String>,
    /// Edge Config identifier, required for `edge-config`
    #[serde(default)]
    pub maintenance_edge_config_id: Option<String>,
    /// Vercel API token, required for `edge-config`
    #[serde(default)]
    pub maintenance_mode_vercel_api_token: Option<String>,
    /// Management API base URL
    #[serde(default)]
    pub management_api_url: Option<String>,
}

impl ToggleOptions {
    pub fn new(provider: Provider, connection_string: impl Into<String>) -> Self {
        Self {
            provider,
            connection_string: connection_string.into(),
            key: None,
            maintenance_edge_config_id: None,
            maintenance_mode_vercel_api_token: None,
            management_api_url: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_edge_config_management(
        mut self,
        edge_config_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.maintenance_edge_config_id = Some(edge_config_id.into());
        self.maintenance_mode_vercel_api_token = Some(api_token.into());
        self
    }

    pub fn with_management_api_url(mut self, url: impl Into<String>) -> Self {
        self.management_api_url = Some(url.into());
        self
    }

    pub fn flag_key(&self) -> &str {
        self.key.as_deref().unwrap_or(DEFAULT_FLAG_KEY)
    }

    pub fn management_api_url(&self) -> &str {
        self.management_api_url
            .as_deref()
            .unwrap_or(DEFAULT_MANAGEMENT_API_URL)
    }
}

/// Which gate hooks were supplied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookPresence {
    pub before_check: bool,
    pub after_check: bool,
}

impl HookPresence {
    pub fn any(&self) -> bool {
        self.before_check || self.after_check
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maintenance gate configuration
    pub gate: GateConfig,
    /// Status toggle configuration
    #[serde(default)]
    pub toggle: ToggleConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Security configuration
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Gate section of the application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Backend holding the flag
    pub provider: Provider,
    /// Backend connection string
    pub connection_string: String,
    /// Maintenance page path
    #[serde(default)]
    pub maintenance_page_slug: Option<String>,
    /// Flag key
    #[serde(default)]
    pub key: Option<String>,
    /// Flag cache lifetime in milliseconds
    #[serde(default)]
    pub cache_time_ms: Option<u64>,
}

/// Toggle section of the application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Edge Config identifier for management writes
    pub maintenance_edge_config_id: Option<String>,
    /// Vercel API token for management writes
    pub maintenance_mode_vercel_api_token: Option<String>,
    /// Management API base URL
    pub management_api_url: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Bearer key for the admin toggle endpoint
    pub admin_api_key: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Options for the request-path gate
    pub fn gate_options(&self) -> GateOptions {
        GateOptions {
            provider: self.gate.provider,
            maintenance_page_slug: self.gate.maintenance_page_slug.clone(),
            key: self.gate.key.clone(),
            cache_time_ms: self.gate.cache_time_ms,
        }
    }

    /// Options for the status toggle, sharing the gate's backend and key
    pub fn toggle_options(&self) -> ToggleOptions {
        ToggleOptions {
            provider: self.gate.provider,
            connection_string: self.gate.connection_string.clone(),
            key: self.gate.key.clone(),
            maintenance_edge_config_id: self.toggle.maintenance_edge_config_id.clone(),
            maintenance_mode_vercel_api_token: self.toggle.maintenance_mode_vercel_api_token.clone(),
            management_api_url: self.toggle.management_api_url.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gate: GateConfig {
                provider: Provider::Upstash,
                connection_string: "https://your-database.upstash.io@your-rest-token".to_string(),
                maintenance_page_slug: Some(DEFAULT_MAINTENANCE_PAGE_SLUG.to_string()),
                key: Some(DEFAULT_FLAG_KEY.to_string()),
                cache_time_ms: Some(5_000),
            },
            toggle: ToggleConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
