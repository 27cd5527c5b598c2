//! Error types for provider operations
//!
//! Lifecycle operations return [`ProviderError`]; the binary and the
//! reconciliation driver wrap it in `anyhow` with extra context.

use thiserror::Error;

/// Result alias used throughout the provider core
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Error type for lifecycle operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request could not be sent or the response body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request body could not be encoded as JSON
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Response body is not valid JSON or lacks an expected field
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// Operation needs a remote identifier but the resource is absent
    #[error("{operation} requires a resource identifier, but the resource has not been created")]
    MissingIdentifier { operation: &'static str },

    /// Identifier cannot be addressed as a single URL path segment
    #[error("invalid resource identifier '{0}'")]
    InvalidIdentifier(String),

    /// Required attribute missing from the local attribute set
    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    /// Attribute present but of the wrong type
    #[error("attribute '{name}' must be a {expected}")]
    InvalidAttribute { name: String, expected: String },

    /// Attribute not declared in the resource schema
    #[error("unsupported attribute: {0}")]
    UnknownAttribute(String),

    /// No resource registered under this type name
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Operation name not one of create/read/update/delete
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Base URL could not be parsed or cannot carry path segments
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ProviderError {
    /// Build a [`ProviderError::MalformedResponse`]
    pub fn malformed(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
