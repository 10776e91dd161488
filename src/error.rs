//! Error types for the portail library
//!
//! This module provides centralized error handling using `thiserror` across all components

use thiserror::Error;

/// Errors raised while talking to the hosted workspace store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (DNS, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store rejected the integration credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown object, or the share was revoked
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store asked us to slow down
    #[error("Rate limited by the store")]
    RateLimited,

    /// The store rejected the request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The store answered with a server error
    #[error("Store unavailable (status {0})")]
    Unavailable(u16),

    /// The response body did not match the expected shape
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Other store errors
    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a malformed response error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    /// Create a generic store error
    pub fn other(reason: impl Into<String>) -> Self {
        Self::Other(reason.into())
    }

    /// Whether the error means the object does not exist or is no longer shared
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while loading the portal configuration
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A required environment variable is absent
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    /// An environment variable is present but unusable
    #[error("Invalid value for {name}: {reason}")]
    InvalidVar { name: String, reason: String },
}

impl ConfigError {
    /// Create a missing variable error
    pub fn missing_var(name: impl Into<String>) -> Self {
        Self::MissingVar(name.into())
    }

    /// Create an invalid variable error
    pub fn invalid_var(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVar {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main unified error type that can represent any portail error
#[derive(Debug, Error)]
pub enum PortalError {
    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The caller asked for a record owned by another client
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The optional comments database is not configured
    #[error("Comments database is not configured")]
    CommentsNotConfigured,

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl PortalError {
    /// Create an access denied error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// Create a generic error
    pub fn other(reason: impl Into<String>) -> Self {
        Self::Other(reason.into())
    }
}

/// Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
