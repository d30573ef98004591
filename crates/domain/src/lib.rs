//! Shared domain types for the Account Planner extension: the configuration
//! registry, the common error type and structured trace events.

pub mod config;
pub mod error;
pub mod trace;

pub use config::{full_storage_key, is_feature_enabled, registry, Config};
pub use error::{Error, Result};
