//! Namespaced REST API client factory.
//!
//! `api_factory` turns a base URL and a handful of settings into callable
//! endpoints. It layers configuration, formats request bodies, composes URLs
//! and routes failed requests to error handlers, and leaves the HTTP work to
//! a swappable [`Transport`] (by default `reqwest`).
//!
//! ## Features
//!
//! - **Layered options**: client settings, endpoint presets and per-call
//!   config merge with well-defined precedence
//! - **Method-aware payloads**: `GET`/`HEAD`/`DELETE` send data as query
//!   params, other methods as a body; multipart forms pass through untouched
//! - **Error dispatch**: handlers by status code, status text, then ordered
//!   named matchers
//! - **Namespaces**: sub-clients, bulk registration and URL-only factories
//! - **Typed decoding**: JSON, YAML, XML, text and binary responses
//!
//! ## Example
//!
//! ```rust,no_run
//! use api_factory::{ApiClient, ApiError, ClientConfig, RequestConfig};
//! use api_factory::response::JsonFormat;
//! use serde_json::json;
//!
//! #[derive(serde::Deserialize)]
//! struct User { id: u64, name: String }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder("https://api.example.com/v1")
//!     .error_default(404, ApiError::Client)
//!     .build()?;
//! let api = ApiClient::with_defaults(config)?;
//!
//! let create_user = api.post("/users", RequestConfig::new());
//! let user = create_user
//!     .fetch::<JsonFormat<User>>(Some(json!({"name": "ann"}).into()), None)
//!     .await?;
//! println!("created {} ({})", user.name, user.id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoint_id;
pub mod error;
pub mod formatter;
pub mod hooks;
pub mod method;
pub mod options;
pub mod payload;
pub mod response;
pub mod transport;
pub mod urls;

// Re-exports for convenience
pub use client::{ApiClient, Endpoint, EndpointSpec, Endpoints, UrlFactory, UrlSpec, UrlTemplate};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use dispatch::{ErrorDefaults, ErrorDispatcher, ErrorMatcher, ErrorMatchers};
pub use endpoint_id::{EndpointId, EndpointIdError};
pub use error::{ApiError, ClientError, ConfigError, RejectionReason, ValidationError};
pub use hooks::{BeforeRequest, HookContext, Plugins};
pub use method::RestMethod;
pub use options::{ContentKind, RequestConfig, RequestOptions};
pub use payload::{MultipartForm, Params, Payload};
pub use response::ResponseFormat;
pub use transport::{ReqwestTransport, Transport, TransportResponse};
