//! Top-level API error type.

use super::{ClientError, ConfigError, ValidationError};
use thiserror::Error;

/// Boxed error returned by error handlers that reshape a failure.
pub type RejectionReason = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all client operations.
///
/// A failed request surfaces either as [`ApiError::Client`] (no handler
/// matched, the original error is passed through) or as whatever the matching
/// error handler returned, typically [`ApiError::Rejected`].
///
/// ## Examples
///
/// ```rust,ignore
/// use api_factory::ApiError;
///
/// fn report(err: ApiError) {
///     match err {
///         ApiError::Client(e) => eprintln!("Request failed: {e}"),
///         ApiError::Rejected(reason) => eprintln!("Handled: {reason}"),
///         ApiError::Validation(e) => eprintln!("Invalid response: {e}"),
///         ApiError::Config(e) => eprintln!("Configuration error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unhandled transport failure.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Failure reshaped by an error handler.
    #[error("{0}")]
    Rejected(RejectionReason),

    /// Response decoding errors.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Client or endpoint configuration errors.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Wraps any error as a handler rejection.
    pub fn rejected<E>(reason: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Rejected(Box::new(reason))
    }

    /// Returns the rejection reason downcast to `E`, if this is a
    /// [`ApiError::Rejected`] holding an `E`.
    pub fn rejection<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Rejected(reason) => reason.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns the underlying transport error if it was not handled.
    pub fn as_client(&self) -> Option<&ClientError> {
        match self {
            Self::Client(e) => Some(e),
            _ => None,
        }
    }
}
