//! Client and endpoint configuration errors.

use thiserror::Error;

use crate::endpoint_id::EndpointIdError;

/// Errors in client or endpoint configuration.
///
/// These are raised synchronously at setup time and indicate programmer
/// errors rather than runtime data errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A URL specification was neither a string nor absent.
    #[error("Unknown URL type: {found}")]
    InvalidUrlSpec {
        /// Rendering of the rejected value.
        found: String,
    },

    /// A bulk registration entry was neither a URL string nor an object
    /// containing a `url` field.
    #[error("Invalid endpoint definition for {name}: expected a URL string or an object with a url field")]
    InvalidEndpointSpec {
        /// The entry name.
        name: String,
    },

    /// Endpoint ID validation failed.
    #[error("Invalid endpoint ID: {0}")]
    InvalidEndpointId(#[from] EndpointIdError),

    /// Duplicate endpoint ID detected.
    #[error("Duplicate endpoint ID: {id}")]
    DuplicateEndpoint {
        /// The duplicate endpoint ID.
        id: String,
    },

    /// A header name or value could not be used.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader {
        /// The header name.
        name: String,
        /// Why the header was rejected.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ConfigError {
    /// Creates an invalid URL specification error.
    pub fn invalid_url_spec(found: impl Into<String>) -> Self {
        Self::InvalidUrlSpec {
            found: found.into(),
        }
    }

    /// Creates an invalid endpoint specification error.
    pub fn invalid_endpoint(name: impl Into<String>) -> Self {
        Self::InvalidEndpointSpec { name: name.into() }
    }
}
