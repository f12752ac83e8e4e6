//! Transport-level request failures.

use thiserror::Error;

/// Errors raised while a request is in flight.
///
/// This is the raw error the [`ErrorDispatcher`](crate::dispatch::ErrorDispatcher)
/// inspects. Only [`ClientError::HttpStatus`] carries an HTTP response; the
/// other variants describe failures where no response was received.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server answered with a non-success HTTP status code.
    #[error("HTTP {status} {status_text}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: u16,
        /// The reason phrase the server sent, or the canonical one.
        status_text: String,
        /// Response body, as text.
        body: String,
    },

    /// HTTP request failed due to network or protocol error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("Request timeout after {duration_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        duration_ms: u64,
    },

    /// Failed to establish connection to the server.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A pre-request hook rejected the request before it was sent.
    #[error("Pre-request hook failed: {0}")]
    Hook(String),
}

impl ClientError {
    /// Creates an HTTP status error, filling the status text from the
    /// canonical reason phrase.
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::http_status_with_reason(status, None, body)
    }

    /// Creates an HTTP status error with the reason phrase the server sent,
    /// falling back to the canonical one when `reason` is `None`.
    pub fn http_status_with_reason(
        status: u16,
        reason: Option<String>,
        body: impl Into<String>,
    ) -> Self {
        let status_text = reason.unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string()
        });
        Self::HttpStatus {
            status,
            status_text,
            body: body.into(),
        }
    }

    /// Returns `true` if the server sent an HTTP response.
    pub fn has_response(&self) -> bool {
        matches!(self, Self::HttpStatus { .. })
    }

    /// Returns the HTTP status code, if a response was received.
    ///
    /// A zero status is treated as no status at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } if *status != 0 => Some(*status),
            _ => None,
        }
    }

    /// Returns the HTTP status text, if a response was received and the text
    /// is non-empty.
    pub fn status_text(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { status_text, .. } if !status_text.is_empty() => {
                Some(status_text.as_str())
            }
            _ => None,
        }
    }

    /// Returns the response body, if a response was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}
