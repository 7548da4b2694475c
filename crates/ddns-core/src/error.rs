//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate. The first
//! group of variants is the reconciliation taxonomy; every error, whatever
//! its variant, collapses onto a [`Status`] via [`Error::status`].

use crate::address::AddressFamily;
use crate::outcome::Status;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The explicitly supplied IP is neither IPv4 nor IPv6
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// Every source for a family was tried and none produced an address
    #[error("Failed to detect public {family} address: {reason}")]
    DetectionFailed {
        /// Family that could not be detected
        family: AddressFamily,
        /// The last source failure
        reason: String,
    },

    /// Reading the existing records failed
    #[error("Failed to query {family} records: {source}")]
    ProviderQuery {
        family: AddressFamily,
        #[source]
        source: Box<Error>,
    },

    /// Creating or updating a record failed
    #[error("Failed to {action} {family} record: {source}")]
    ProviderMutation {
        family: AddressFamily,
        /// "create" or "update"
        action: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Required configuration (zone, token, hostname) is missing
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The run deadline expired while the operation was in flight
    #[error("{0} timed out")]
    Timeout(String),

    /// The run was cancelled while the operation was in flight
    #[error("{0} cancelled")]
    Cancelled(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a detection failure for `family`
    pub fn detection_failed(family: AddressFamily, reason: impl Into<String>) -> Self {
        Self::DetectionFailed {
            family,
            reason: reason.into(),
        }
    }

    /// Wrap a provider error raised while listing records
    pub fn provider_query(family: AddressFamily, source: Error) -> Self {
        Self::ProviderQuery {
            family,
            source: Box::new(source),
        }
    }

    /// Wrap a provider error raised while creating or updating a record
    pub fn provider_mutation(family: AddressFamily, action: &'static str, source: Error) -> Self {
        Self::ProviderMutation {
            family,
            action,
            source: Box::new(source),
        }
    }

    /// Create a missing credentials error
    pub fn missing_credentials(msg: impl Into<String>) -> Self {
        Self::MissingCredentials(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error for the named operation
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout(operation.into())
    }

    /// Create a cancellation error for the named operation
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled(operation.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Status this error reports to the caller
    ///
    /// Errors outside the reconciliation taxonomy (a bare transport error
    /// surfacing directly) count as a generic `Failure`.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidAddress(_) => Status::InvalidAddress,
            Self::DetectionFailed { .. } => Status::DetectionFailed,
            Self::ProviderQuery { .. } => Status::ProviderQueryFailed,
            Self::MissingCredentials(_) => Status::MissingCredentials,
            _ => Status::Failure,
        }
    }

    /// Whether the underlying cause is an authentication rejection
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Authentication(_) => true,
            Self::ProviderQuery { source, .. } | Self::ProviderMutation { source, .. } => {
                source.is_auth()
            }
            _ => false,
        }
    }
}
