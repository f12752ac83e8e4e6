//! The client factory.
//!
//! [`ApiClient`] owns the configuration and transport of one namespace and
//! hands out [`Endpoint`]s, [`UrlFactory`]s and nested clients.
//!
//! ## Examples
//!
//! ```rust
//! use api_factory::{ApiClient, ClientConfig, EndpointSpec, RequestConfig, RestMethod};
//!
//! # fn main() -> Result<(), api_factory::ConfigError> {
//! let api = ApiClient::with_defaults(
//!     ClientConfig::builder("http://localhost:8080/context-path").build()?,
//! )?;
//!
//! let user = api.sub_factory("/user")?;
//! let find_all = user.get("/findAllUser", RequestConfig::new());
//! assert_eq!(find_all.url(), "http://localhost:8080/context-path/user/findAllUser");
//!
//! let orders = api.registry_all(
//!     "/order",
//!     RestMethod::Get,
//!     [("list", EndpointSpec::from("/list"))],
//!     RequestConfig::new(),
//! )?;
//! assert_eq!(orders["list"].url(), "http://localhost:8080/context-path/order/list");
//! # Ok(())
//! # }
//! ```

mod endpoint;
mod executor;
mod url_factory;

pub use endpoint::{Endpoint, EndpointSpec, Endpoints, UrlBuilder, UrlTemplate};
pub use executor::ApiClient;
pub use url_factory::{UrlFactory, UrlSpec};
