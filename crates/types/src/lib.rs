//! Shared types for the maintenance mode gate
//!
//! This crate contains the domain types used across the configuration,
//! flag store and middleware crates.

pub mod error;
pub mod flag;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, MaintenanceError, Result, StoreError};
pub use flag::{FlagValue, Provider, DEFAULT_FLAG_KEY, DEFAULT_MAINTENANCE_PAGE_SLUG};
