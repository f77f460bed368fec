//! Configuration management for the maintenance mode gate
//!
//! This crate holds the typed gate and toggle options, validates them, and
//! loads the application configuration from YAML files and environment
//! variables.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigLoader;
pub use schema::*;
pub use validation::*;
