//! Error types for the maintenance mode gate

use thiserror::Error;

/// Main error type surfaced by the gate and the status toggle
///
/// Only the human-readable message of an underlying failure is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceError {
    /// Bad provider, mismatched connection string, missing hooks or toggle fields
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend was reachable but the flag key does not exist
    #[error("Maintenance mode key is not found in the specified provider: {key}")]
    FlagMissing { key: String },

    /// Backend unreachable, malformed response or rejected write
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A caller-supplied hook failed
    #[error("Hook error: {0}")]
    Hook(String),
}

impl MaintenanceError {
    /// Build a hook error from anything printable
    pub fn hook(message: impl Into<String>) -> Self {
        MaintenanceError::Hook(message.into())
    }
}

/// Result type alias for maintenance mode operations
pub type Result<T> = std::result::Result<T, MaintenanceError>;

/// Configuration specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl ConfigError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Flag store backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The request never produced a response
    #[error("Request to {backend} failed: {message}")]
    Transport { backend: String, message: String },

    /// Non-success HTTP status
    #[error("HTTP error from {backend}: {status} - {reason}")]
    HttpError {
        backend: String,
        status: u16,
        reason: String,
    },

    /// The backend answered with an explicit error payload
    #[error("{backend} reported an error: {message}")]
    Backend { backend: String, message: String },

    /// Response body could not be understood
    #[error("Invalid response from {backend}: {message}")]
    InvalidResponse { backend: String, message: String },

    /// The stored value is not a boolean
    #[error("Value stored under {key} in {backend} is not a boolean: {value}")]
    InvalidValue {
        backend: String,
        key: String,
        value: String,
    },
}

// Conversion implementations for common error types

impl From<ConfigError> for MaintenanceError {
    fn from(err: ConfigError) -> Self {
        match err {
            // Validation messages are shown to callers verbatim
            ConfigError::ValidationError { message, .. } => MaintenanceError::Configuration(message),
            other => MaintenanceError::Configuration(other.to_string()),
        }
    }
}

impl From<StoreError> for MaintenanceError {
    fn from(err: StoreError) -> Self {
        MaintenanceError::Fetch(err.to_string())
    }
}
