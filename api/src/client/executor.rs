//! Request execution with tracing instrumentation.
//!
//! This module provides the [`ApiClient`] struct: a namespaced factory that
//! registers endpoints, layers their configuration and sends them through a
//! swappable [`Transport`].

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument, Span};

use crate::client::endpoint::{Endpoint, EndpointSpec, Endpoints, UrlTemplate};
use crate::client::url_factory::{UrlFactory, UrlSpec};
use crate::config::ClientConfig;
use crate::dispatch::ErrorDispatcher;
use crate::endpoint_id::EndpointId;
use crate::error::{ApiError, ConfigError};
use crate::hooks::{BeforeRequest, HookContext};
use crate::method::RestMethod;
use crate::options::{RequestConfig, RequestOptions};
use crate::transport::{ReqwestTransport, Transport, TransportResponse};
use crate::urls::concat_urls;

/// Async API client factory.
///
/// Cloning is cheap; clones share the configuration and the transport cell,
/// so [`set_transport`](Self::set_transport) on one clone is seen by all.
///
/// ## Examples
///
/// ```rust,no_run
/// use api_factory::{ApiClient, ClientConfig, RequestConfig};
/// use serde_json::json;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder("https://api.example.com/v1").build()?;
/// let client = ApiClient::with_defaults(config)?;
///
/// let find_user = client.get("/users/{id}", RequestConfig::new());
/// let body = find_user
///     .call_with(&[("id", "42")], Some(json!({"expand": "roles"}).into()), None)
///     .await?;
/// # let _ = body;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ClientConfig,
    transport: RwLock<Arc<dyn Transport>>,
}

impl ApiClient {
    /// Creates a client with a [`ReqwestTransport`] built from `config`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::create(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Like [`new`](Self::new), but installs the form content formatter as
    /// the pre-request hook unless `config` already has one.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_defaults(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::new(config.or_before_request(BeforeRequest::content_formatter()))
    }

    /// Creates a client sending through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport: RwLock::new(transport),
            }),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        self.inner.config.base_url()
    }

    /// Replaces the transport.
    ///
    /// Requests already in flight keep the transport they started with.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) -> &Self {
        *self.inner.transport.write() = transport;
        self
    }

    /// Hands the current transport to `f`; a returned transport replaces it.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use api_factory::{ApiClient, ClientConfig};
    ///
    /// # fn main() -> Result<(), api_factory::ConfigError> {
    /// let client = ApiClient::new(ClientConfig::builder("http://localhost").build()?)?;
    /// client.configure(|current| {
    ///     // inspect or wrap `current`; `None` keeps it
    ///     let _ = current;
    ///     None
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn configure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Arc<dyn Transport>) -> Option<Arc<dyn Transport>>,
    {
        if let Some(replacement) = f(self.transport()) {
            self.set_transport(replacement);
        } else {
            debug!("transport configurator kept the current transport");
        }
        self
    }

    /// Returns the current transport.
    ///
    /// Requests sent through it directly skip the pre-request hook and error
    /// dispatch.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.inner.transport.read().clone()
    }

    /// Sends `options` and returns the response body.
    ///
    /// Client settings fill whatever `options` leaves unset. The pre-request
    /// hook runs first; failures from the hook or the transport go through
    /// the error dispatcher.
    ///
    /// ## Errors
    ///
    /// Returns the dispatcher's result for any failure: a handler's
    /// [`ApiError`] or the original [`ApiError::Client`].
    pub async fn request(&self, options: RequestOptions) -> Result<Bytes, ApiError> {
        self.send(options).await.map(|response| response.data)
    }

    /// Like [`request`](Self::request), but returns the whole response.
    ///
    /// ## Errors
    ///
    /// See [`request`](Self::request).
    #[instrument(
        name = "api_request",
        skip(self, options),
        fields(
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    pub async fn send(&self, options: RequestOptions) -> Result<TransportResponse, ApiError> {
        let options = self.with_settings(options);
        let dispatcher = ErrorDispatcher::for_request(self.config(), &options);
        let transport = options.transport.clone().unwrap_or_else(|| self.transport());

        let prepared = match self.config().before_request() {
            Some(hook) => hook.run(options, HookContext::new(transport.clone())).await,
            None => Ok(options),
        };
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!(error = %err, "pre-request hook failed");
                Span::current().record("otel.status_code", "ERROR");
                return Err(dispatcher.handle_failure(err));
            }
        };

        Span::current().record("http.method", prepared.method.as_str());
        Span::current().record("http.url", prepared.full_url().as_str());

        match transport.request(prepared).await {
            Ok(response) => {
                Span::current().record("http.status_code", response.status);
                Span::current().record("otel.status_code", "OK");
                Ok(response)
            }
            Err(err) => {
                let otel_status = match err.status_code() {
                    Some(status) => {
                        Span::current().record("http.status_code", status);
                        if status >= 500 {
                            "ERROR"
                        } else {
                            "UNSET"
                        }
                    }
                    None => "ERROR",
                };
                Span::current().record("otel.status_code", otel_status);
                Err(dispatcher.handle_failure(err))
            }
        }
    }

    /// Lays the client settings under `options`.
    ///
    /// Headers are merged by name with the request's values winning; the
    /// default transport sends the settings headers regardless.
    fn with_settings(&self, mut options: RequestOptions) -> RequestOptions {
        let config = self.config();
        let settings = config.settings();

        if options.base_url.is_none() {
            options.base_url = Some(
                settings
                    .base_url
                    .clone()
                    .unwrap_or_else(|| config.base_url().to_string()),
            );
        }
        for (name, value) in settings.headers.iter().flatten() {
            if options.header(name).is_none() {
                options.headers.push((name.clone(), value.clone()));
            }
        }
        options.timeout = options.timeout.or(settings.timeout);
        options.content_type = options.content_type.or(settings.content_type);
        for (key, value) in &settings.extra {
            if !options.extra.contains_key(key) {
                options.extra.insert(key.clone(), value.clone());
            }
        }
        options
    }

    /// Calls `f` with this client and its configuration.
    pub fn transform<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&ApiClient, &ClientConfig) -> T,
    {
        f(self, self.config())
    }

    /// Returns a factory composing URLs under this client's base URL.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use api_factory::{ApiClient, ClientConfig, UrlSpec};
    ///
    /// # fn main() -> Result<(), api_factory::ConfigError> {
    /// let client = ApiClient::new(ClientConfig::builder("http://cdn.local/files").build()?)?;
    /// let download = client.url_factory("/download");
    /// assert_eq!(download.url(None), "http://cdn.local/files/download");
    /// assert_eq!(client.url_factory(UrlSpec::None).url(None), "http://cdn.local/files");
    /// # Ok(())
    /// # }
    /// ```
    pub fn url_factory(&self, spec: impl Into<UrlSpec>) -> UrlFactory {
        UrlFactory::new(self.base_url(), spec.into())
    }

    /// Returns an independent client rooted at `base_url + sub_url`.
    ///
    /// Settings, hook and error handlers are inherited; the transport is a
    /// fresh [`ReqwestTransport`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn sub_factory(&self, sub_url: &str) -> Result<ApiClient, ConfigError> {
        let config = self.config().nested(sub_url);
        debug!(base_url = %config.base_url(), "creating namespaced client");
        Self::new(config)
    }

    /// Registers an endpoint.
    ///
    /// `options.params` and `options.data` become the endpoint's preset
    /// params and data; everything else is applied to each call.
    pub fn registry(
        &self,
        url: impl Into<UrlTemplate>,
        method: RestMethod,
        options: RequestConfig,
    ) -> Endpoint {
        let (preset_params, preset_data, options) = options.split_payload();
        Endpoint::new(
            self.clone(),
            url.into(),
            method,
            preset_params.unwrap_or_default(),
            preset_data.unwrap_or_default(),
            options,
        )
    }

    /// Registers a `GET` endpoint.
    pub fn get(&self, url: impl Into<UrlTemplate>, options: RequestConfig) -> Endpoint {
        self.registry(url, RestMethod::Get, options)
    }

    /// Registers a `POST` endpoint.
    pub fn post(&self, url: impl Into<UrlTemplate>, options: RequestConfig) -> Endpoint {
        self.registry(url, RestMethod::Post, options)
    }

    /// Registers a `PUT` endpoint.
    pub fn put(&self, url: impl Into<UrlTemplate>, options: RequestConfig) -> Endpoint {
        self.registry(url, RestMethod::Put, options)
    }

    /// Registers a `PATCH` endpoint.
    pub fn patch(&self, url: impl Into<UrlTemplate>, options: RequestConfig) -> Endpoint {
        self.registry(url, RestMethod::Patch, options)
    }

    /// Registers a `DELETE` endpoint.
    pub fn delete(&self, url: impl Into<UrlTemplate>, options: RequestConfig) -> Endpoint {
        self.registry(url, RestMethod::Delete, options)
    }

    /// Alias of [`delete`](Self::delete).
    pub fn del(&self, url: impl Into<UrlTemplate>, options: RequestConfig) -> Endpoint {
        self.delete(url, options)
    }

    /// Registers a group of endpoints under `sub_url`.
    ///
    /// Each entry is registered at `sub_url + url` with `method` and
    /// `defaults`, unless a [`EndpointSpec::Detailed`] entry overrides the
    /// method or lays its own options over the defaults.
    ///
    /// ## Errors
    ///
    /// Returns an error if a name is empty or appears twice.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use api_factory::{ApiClient, ClientConfig, EndpointSpec, RequestConfig, RestMethod};
    ///
    /// # fn main() -> Result<(), api_factory::ConfigError> {
    /// let client = ApiClient::new(ClientConfig::builder("http://localhost:8080/ctx").build()?)?;
    /// let user = client.registry_all(
    ///     "/user",
    ///     RestMethod::Get,
    ///     [
    ///         ("findAll", EndpointSpec::from("/findAllUser")),
    ///         ("save", EndpointSpec::detailed("/saveUser").method(RestMethod::Post)),
    ///     ],
    ///     RequestConfig::new(),
    /// )?;
    ///
    /// assert_eq!(user["findAll"].url(), "http://localhost:8080/ctx/user/findAllUser");
    /// assert_eq!(user["save"].method(), &RestMethod::Post);
    /// # Ok(())
    /// # }
    /// ```
    pub fn registry_all<I, N>(
        &self,
        sub_url: &str,
        method: RestMethod,
        apis: I,
        defaults: RequestConfig,
    ) -> Result<Endpoints, ConfigError>
    where
        I: IntoIterator<Item = (N, EndpointSpec)>,
        N: Into<String>,
    {
        let mut endpoints = Endpoints::default();

        for (name, spec) in apis {
            let id = EndpointId::new(name)?;
            if endpoints.contains(id.as_str()) {
                return Err(ConfigError::DuplicateEndpoint { id: id.into() });
            }

            let (url, method, options) = match spec {
                EndpointSpec::Url(url) => (url, method.clone(), defaults.clone()),
                EndpointSpec::Detailed {
                    url,
                    method: entry_method,
                    options,
                } => (
                    url.unwrap_or_default(),
                    entry_method.unwrap_or_else(|| method.clone()),
                    defaults.clone().overlay(options),
                ),
            };

            let endpoint = self.registry(concat_urls([sub_url, url.as_str()]), method, options);
            debug!(name = %id, method = %endpoint.method(), "registered endpoint");
            endpoints.insert(id, endpoint);
        }

        Ok(endpoints)
    }

    /// Like [`registry_all`](Self::registry_all), reading the entries from a
    /// JSON object.
    ///
    /// Each value must be a URL string or an object with optional `url` and
    /// `method` fields; the object's other fields are read with
    /// [`RequestConfig::from_json`]. `null` registers nothing.
    ///
    /// ## Errors
    ///
    /// Returns an error if `apis` is not an object, an entry has another
    /// shape, or a name is invalid or repeated.
    pub fn registry_all_from_value(
        &self,
        sub_url: &str,
        method: RestMethod,
        apis: &Value,
        defaults: RequestConfig,
    ) -> Result<Endpoints, ConfigError> {
        let entries = match apis {
            Value::Null => return Ok(Endpoints::default()),
            Value::Object(entries) => entries,
            other => return Err(ConfigError::invalid_endpoint(other.to_string())),
        };

        let specs = entries
            .iter()
            .map(|(name, value)| Ok((name.clone(), EndpointSpec::from_value(name, value)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        self.registry_all(sub_url, method, specs, defaults)
    }
}
