//! Configuration validation utilities

use crate::schema::{Config, GateOptions, HookPresence, ToggleOptions};
use types::{utils::is_http_url, ConfigError, Provider};

/// Rejection message for a connection string that does not fit its provider
pub const INVALID_CONNECTION_STRING: &str = "Invalid connection string for the selected provider";

/// Rejection message for a gate without hooks
pub const MISSING_HOOKS: &str =
    "At least one of 'beforeCheck' or 'afterCheck' middleware functions must be defined";

/// Rejection message for Edge Config toggles without management credentials
pub const MISSING_MANAGEMENT_CREDENTIALS: &str =
    "Missing maintenanceEdgeConfigId or maintenanceModeVercelApiToken";

/// Cache lifetimes above this are flagged in reports
const LONG_CACHE_TIME_MS: u64 = 60_000;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate everything a gate needs, stopping at the first violated rule.
    ///
    /// The provider is already a typed enum, so the checks are the connection
    /// string shape, the optional strings, then the hook invariant.
    pub fn validate_gate(
        hooks: HookPresence,
        connection_string: &str,
        options: &GateOptions,
    ) -> Result<(), ConfigError> {
        Self::validate_connection(options.provider, connection_string)?;

        if matches!(options.key.as_deref(), Some(key) if key.trim().is_empty()) {
            return Err(ConfigError::validation("key", "Flag key cannot be empty"));
        }

        if matches!(options.maintenance_page_slug.as_deref(), Some(slug) if slug.trim().is_empty()) {
            return Err(ConfigError::validation(
                "maintenance_page_slug",
                "Maintenance page slug cannot be empty",
            ));
        }

        Self::validate_hooks(hooks)
    }

    /// At least one hook must be present
    pub fn validate_hooks(hooks: HookPresence) -> Result<(), ConfigError> {
        if !hooks.any() {
            return Err(ConfigError::validation("middleware", MISSING_HOOKS));
        }
        Ok(())
    }

    /// The connection string must be non-empty and carry the provider's marker
    pub fn validate_connection(provider: Provider, connection_string: &str) -> Result<(), ConfigError> {
        if connection_string.is_empty() {
            return Err(ConfigError::MissingField {
                field: "connection_string".to_string(),
            });
        }

        if !provider.matches_connection_string(connection_string) {
            return Err(ConfigError::validation("connection_string", INVALID_CONNECTION_STRING));
        }

        Ok(())
    }

    /// Validate options for the status toggle
    pub fn validate_toggle(options: &ToggleOptions) -> Result<(), ConfigError> {
        Self::validate_connection(options.provider, &options.connection_string)?;

        if matches!(options.key.as_deref(), Some(key) if key.trim().is_empty()) {
            return Err(ConfigError::validation("key", "Flag key cannot be empty"));
        }

        if options.provider == Provider::EdgeConfig {
            let has_id = options
                .maintenance_edge_config_id
                .as_deref()
                .is_some_and(|id| !id.is_empty());
            let has_token = options
                .maintenance_mode_vercel_api_token
                .as_deref()
                .is_some_and(|token| !token.is_empty());

            if !has_id || !has_token {
                return Err(ConfigError::validation(
                    "maintenance_edge_config_id",
                    MISSING_MANAGEMENT_CREDENTIALS,
                ));
            }

            if !is_http_url(options.management_api_url()) {
                return Err(ConfigError::validation(
                    "management_api_url",
                    format!("Management API URL must start with http:// or https://: {}", options.management_api_url()),
                ));
            }
        }

        Ok(())
    }

    /// Validate a complete application configuration
    pub fn report(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::report_gate(config, &mut report);
        Self::report_toggle(config, &mut report);
        Self::report_server(config, &mut report);
        Self::report_logging(config, &mut report);
        Self::report_security(config, &mut report);

        report
    }

    fn report_gate(config: &Config, report: &mut ValidationReport) {
        if let Err(e) = Self::validate_connection(config.gate.provider, &config.gate.connection_string) {
            report.add_error("gate.connection_string", &issue_message(&e));
        }

        if let Some(ref slug) = config.gate.maintenance_page_slug {
            if slug.trim().is_empty() {
                report.add_error("gate.maintenance_page_slug", "Maintenance page slug cannot be empty");
            } else if !slug.starts_with('/') {
                report.add_warning(
                    "gate.maintenance_page_slug",
                    &format!("Maintenance page slug '{}' will be served as '/{}'", slug, slug),
                );
            }
        }

        if matches!(config.gate.key.as_deref(), Some(key) if key.trim().is_empty()) {
            report.add_error("gate.key", "Flag key cannot be empty");
        }

        match config.gate.cache_time_ms {
            None | Some(0) => {
                report.add_warning("gate.cache_time_ms", "Flag caching is disabled, every request reads the backend");
            }
            Some(ms) if ms > LONG_CACHE_TIME_MS => {
                report.add_warning(
                    "gate.cache_time_ms",
                    &format!("Cache time of {}ms delays maintenance toggles by up to that long", ms),
                );
            }
            _ => {}
        }
    }

    fn report_toggle(config: &Config, report: &mut ValidationReport) {
        if let Err(e) = Self::validate_toggle(&config.toggle_options()) {
            // The gate works without toggle credentials; only the admin surfaces need them
            report.add_warning("toggle", &issue_message(&e));
        }
    }

    fn report_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "Server port cannot be 0");
        } else if config.server.port < 1024 {
            report.add_warning("server.port", "Server port is below 1024, may require elevated privileges");
        }

        if config.server.request_timeout_seconds == 0 {
            report.add_error("server.request_timeout_seconds", "Request timeout cannot be 0");
        }

        if config.server.host.is_empty() {
            report.add_error("server.host", "Server host cannot be empty");
        }
    }

    fn report_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error("logging.level", &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error("logging.format", &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats));
        }
    }

    fn report_security(config: &Config, report: &mut ValidationReport) {
        match config.security.admin_api_key {
            None => {
                report.add_warning("security.admin_api_key", "No admin API key configured, the maintenance toggle endpoint will be unprotected");
            }
            Some(ref key) if key.len() < 16 => {
                report.add_warning("security.admin_api_key", "Admin API key is short, consider using a longer key");
            }
            _ => {}
        }
    }
}

/// Message of a configuration error without its field prefix
fn issue_message(err: &ConfigError) -> String {
    match err {
        ConfigError::ValidationError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// First error as a typed configuration error
    pub fn first_error(&self) -> Option<ConfigError> {
        self.errors
            .first()
            .map(|issue| ConfigError::validation(&issue.field, issue.message.clone()))
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
