//! Layered error types for the client factory.
//!
//! - [`ApiError`] - Top-level error type for all client operations
//! - [`ClientError`] - Transport failures, the input of error dispatch
//! - [`ValidationError`] - Response decoding errors
//! - [`ConfigError`] - Client and endpoint configuration errors

mod api_error;
mod client_error;
mod config_error;
mod validation_error;

pub use api_error::{ApiError, RejectionReason};
pub use client_error::ClientError;
pub use config_error::ConfigError;
pub use validation_error::ValidationError;
