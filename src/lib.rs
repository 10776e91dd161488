#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod portal;
pub mod properties;
pub mod store;

// Re-export common error types for convenience
pub use error::{ConfigError, ConfigResult, PortalError, PortalResult, StoreError, StoreResult};
