//! Client configuration.

use std::time::Duration;

use serde_json::Value;

use crate::dispatch::{ErrorDefaults, ErrorMatcher, ErrorMatchers};
use crate::error::{ApiError, ClientError, ConfigError};
use crate::hooks::BeforeRequest;
use crate::options::{ContentKind, RequestConfig};
use crate::urls::{concat_urls, is_absolute};

/// Configuration of one [`ApiClient`](crate::ApiClient).
///
/// Immutable once built. Namespaces derived with
/// [`ApiClient::sub_factory`](crate::ApiClient::sub_factory) copy it with a
/// longer base URL.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    settings: RequestConfig,
    before_request: Option<BeforeRequest>,
    error_defaults: ErrorDefaults,
    error_matchers: ErrorMatchers,
}

impl ClientConfig {
    /// Creates a builder for a client rooted at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url.into())
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the settings applied under every request.
    pub fn settings(&self) -> &RequestConfig {
        &self.settings
    }

    /// Returns the configured pre-request hook, if any.
    pub fn before_request(&self) -> Option<&BeforeRequest> {
        self.before_request.as_ref()
    }

    /// Returns the client-wide error defaults.
    pub fn error_defaults(&self) -> &ErrorDefaults {
        &self.error_defaults
    }

    /// Returns the client-wide error matchers.
    pub fn error_matchers(&self) -> &ErrorMatchers {
        &self.error_matchers
    }

    /// Returns a copy rooted at `base_url + sub_url`.
    pub(crate) fn nested(&self, sub_url: &str) -> Self {
        Self {
            base_url: concat_urls([self.base_url.as_str(), sub_url]),
            ..self.clone()
        }
    }

    /// Returns a copy using `hook` when no hook was configured.
    pub(crate) fn or_before_request(mut self, hook: BeforeRequest) -> Self {
        self.before_request.get_or_insert(hook);
        self
    }
}

/// Builder for [`ClientConfig`].
///
/// ## Examples
///
/// ```rust
/// use std::time::Duration;
/// use api_factory::{ApiError, ClientConfig};
///
/// let config = ClientConfig::builder("https://api.example.com/v1")
///     .header("Accept", "application/json")
///     .timeout(Duration::from_secs(10))
///     .error_default(401, ApiError::Client)
///     .build()?;
/// assert_eq!(config.base_url(), "https://api.example.com/v1");
/// # Ok::<(), api_factory::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    settings: RequestConfig,
    before_request: Option<BeforeRequest>,
    error_defaults: ErrorDefaults,
    error_matchers: ErrorMatchers,
}

impl ClientConfigBuilder {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            settings: RequestConfig::new(),
            before_request: None,
            error_defaults: ErrorDefaults::new(),
            error_matchers: ErrorMatchers::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings = self.settings.header(name, value);
        self
    }

    /// Sets the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings = self.settings.timeout(timeout);
        self
    }

    /// Sets the default content type shortcut.
    pub fn content_type(mut self, kind: ContentKind) -> Self {
        self.settings = self.settings.content_type(kind);
        self
    }

    /// Adds a passthrough option visible to hooks on every request.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings = self.settings.extra(key, value);
        self
    }

    /// Sets the pre-request hook.
    pub fn before_request(mut self, hook: BeforeRequest) -> Self {
        self.before_request = Some(hook);
        self
    }

    /// Registers a handler for a status code.
    pub fn error_default<F>(mut self, status: u16, handler: F) -> Self
    where
        F: Fn(ClientError) -> ApiError + Send + Sync + 'static,
    {
        self.error_defaults = self.error_defaults.on_status(status, handler);
        self
    }

    /// Registers a handler for a status text.
    pub fn error_status_text_default<F>(mut self, status_text: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ClientError) -> ApiError + Send + Sync + 'static,
    {
        self.error_defaults = self.error_defaults.on_status_text(status_text, handler);
        self
    }

    /// Replaces the error defaults.
    pub fn error_defaults(mut self, defaults: ErrorDefaults) -> Self {
        self.error_defaults = defaults;
        self
    }

    /// Adds an error matcher.
    pub fn error_matcher(mut self, matcher: ErrorMatcher) -> Self {
        self.error_matchers.push(matcher);
        self
    }

    /// Replaces the error matchers.
    pub fn error_matchers(mut self, matchers: ErrorMatchers) -> Self {
        self.error_matchers = matchers;
        self
    }

    /// Builds the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if the base URL carries a scheme but does not parse.
    /// Relative base URLs are accepted; endpoints must then use absolute
    /// URLs.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if is_absolute(&self.base_url) {
            url::Url::parse(&self.base_url)?;
        }

        Ok(ClientConfig {
            base_url: self.base_url,
            settings: self.settings,
            before_request: self.before_request,
            error_defaults: self.error_defaults,
            error_matchers: self.error_matchers,
        })
    }
}
