//! Flag store backends for the maintenance mode gate
//!
//! This crate reads and writes the maintenance flag in Upstash Redis and
//! Vercel Edge Config behind one [`FlagStore`] contract, memoizes reads in a
//! single-slot [`FlagCache`], and exposes [`set_status`] for operators.

pub mod cache;
pub mod edge_config;
pub mod memory;
pub mod store;
pub mod toggle;
pub mod upstash;

pub use cache::*;
pub use edge_config::*;
pub use memory::*;
pub use store::*;
pub use toggle::*;
pub use upstash::*;
