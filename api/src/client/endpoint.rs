//! Registered endpoints.
//!
//! An [`Endpoint`] is what [`ApiClient::registry`] and its shortcuts return:
//! a URL, a method and preset configuration bound to a client. Calling it
//! merges the per-call data and config over the presets and sends the
//! request.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::client::ApiClient;
use crate::endpoint_id::EndpointId;
use crate::error::{ApiError, ConfigError};
use crate::method::RestMethod;
use crate::options::{merge_for_request, RequestConfig, RequestOptions};
use crate::payload::{Params, Payload};
use crate::response::ResponseFormat;
use crate::urls::{concat_urls, is_absolute};

/// Builds a URL path from positional path arguments.
pub type UrlBuilder = Arc<dyn Fn(&[(&str, &str)]) -> String + Send + Sync>;

/// The URL of an endpoint.
///
/// ## Examples
///
/// ```rust
/// use api_factory::UrlTemplate;
///
/// let template = UrlTemplate::from("/users/{id}/posts/{post}");
/// assert_eq!(template.placeholders(), vec!["id", "post"]);
/// assert_eq!(template.render(&[("id", "7"), ("post", "3")]), "/users/7/posts/3");
///
/// let built = UrlTemplate::builder(|args| format!("/files/{}", args[0].1));
/// assert_eq!(built.render(&[("name", "a.txt")]), "/files/a.txt");
/// ```
#[derive(Clone)]
pub enum UrlTemplate {
    /// A path, optionally with `{name}` placeholders.
    Path(String),
    /// A caller-supplied builder.
    Builder(UrlBuilder),
}

impl UrlTemplate {
    /// Wraps a URL builder closure.
    pub fn builder<F>(f: F) -> Self
    where
        F: Fn(&[(&str, &str)]) -> String + Send + Sync + 'static,
    {
        Self::Builder(Arc::new(f))
    }

    /// Produces the URL for `args`.
    ///
    /// Placeholders without a matching argument are left in place.
    pub fn render(&self, args: &[(&str, &str)]) -> String {
        match self {
            Self::Path(path) => {
                let mut path = path.clone();
                for (key, value) in args {
                    path = path.replace(&format!("{{{key}}}"), value);
                }
                path
            }
            Self::Builder(build) => build(args),
        }
    }

    /// Returns the placeholder names of a path, in order. Builders have none.
    pub fn placeholders(&self) -> Vec<&str> {
        let Self::Path(path) = self else {
            return Vec::new();
        };

        let mut names = Vec::new();
        let mut rest = path.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            if end > 0 {
                names.push(&after[..end]);
            }
            rest = &after[end + 1..];
        }
        names
    }
}

impl fmt::Debug for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Builder(_) => f.write_str("Builder(..)"),
        }
    }
}

impl From<&str> for UrlTemplate {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for UrlTemplate {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

/// A callable endpoint bound to an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct Endpoint {
    client: ApiClient,
    url: UrlTemplate,
    method: RestMethod,
    preset_params: Params,
    preset_data: Params,
    options: RequestConfig,
}

impl Endpoint {
    pub(crate) fn new(
        client: ApiClient,
        url: UrlTemplate,
        method: RestMethod,
        preset_params: Params,
        preset_data: Params,
        options: RequestConfig,
    ) -> Self {
        Self {
            client,
            url,
            method,
            preset_params,
            preset_data,
            options,
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &RestMethod {
        &self.method
    }

    /// Returns the URL template.
    pub fn template(&self) -> &UrlTemplate {
        &self.url
    }

    /// Returns the preset params.
    pub fn preset_params(&self) -> &Params {
        &self.preset_params
    }

    /// Returns the preset data.
    pub fn preset_data(&self) -> &Params {
        &self.preset_data
    }

    /// Returns the absolute URL with no path arguments.
    pub fn url(&self) -> String {
        self.url_with(&[])
    }

    /// Returns the absolute URL for `args`.
    pub fn url_with(&self, args: &[(&str, &str)]) -> String {
        let path = self.url.render(args);
        if is_absolute(&path) {
            return path;
        }
        let base = self
            .options
            .base_url
            .as_deref()
            .or(self.client.config().settings().base_url.as_deref())
            .unwrap_or_else(|| self.client.base_url());
        concat_urls([base, path.as_str()])
    }

    /// Assembles the options for one call without sending them.
    ///
    /// Client settings are applied later, by [`ApiClient::request`].
    pub fn prepare(
        &self,
        args: &[(&str, &str)],
        data: Option<Payload>,
        config: Option<RequestConfig>,
    ) -> RequestOptions {
        let merged = merge_for_request(
            &self.method,
            data,
            config,
            &self.preset_params,
            &self.preset_data,
        );
        RequestOptions::new(self.method.clone(), self.url.render(args))
            .with_config(&self.options)
            .with_merged(merged)
    }

    /// Sends a request and returns the response body.
    ///
    /// For `GET`, `HEAD` and `DELETE` the data is merged into the query
    /// params; for other methods it is merged into the body.
    ///
    /// ## Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn call(
        &self,
        data: Option<Payload>,
        config: Option<RequestConfig>,
    ) -> Result<Bytes, ApiError> {
        self.call_with(&[], data, config).await
    }

    /// Like [`call`](Self::call), filling URL placeholders from `args`.
    ///
    /// ## Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn call_with(
        &self,
        args: &[(&str, &str)],
        data: Option<Payload>,
        config: Option<RequestConfig>,
    ) -> Result<Bytes, ApiError> {
        self.client.request(self.prepare(args, data, config)).await
    }

    /// Sends a request and parses the body with `F`.
    ///
    /// ## Errors
    ///
    /// Returns [`ApiError::Validation`] if the body does not parse, or any
    /// error [`call`](Self::call) returns.
    ///
    /// ## Examples
    ///
    /// ```rust,no_run
    /// use api_factory::{ApiClient, ClientConfig, RequestConfig};
    /// use api_factory::response::JsonFormat;
    ///
    /// #[derive(serde::Deserialize)]
    /// struct User { id: u64, name: String }
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = ApiClient::new(ClientConfig::builder("https://api.example.com").build()?)?;
    /// let user = client
    ///     .get("/users/1", RequestConfig::new())
    ///     .fetch::<JsonFormat<User>>(None, None)
    ///     .await?;
    /// println!("{} {}", user.id, user.name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch<F>(
        &self,
        data: Option<Payload>,
        config: Option<RequestConfig>,
    ) -> Result<F::Output, ApiError>
    where
        F: ResponseFormat,
    {
        self.fetch_with::<F>(&[], data, config).await
    }

    /// Like [`fetch`](Self::fetch), filling URL placeholders from `args`.
    ///
    /// ## Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn fetch_with<F>(
        &self,
        args: &[(&str, &str)],
        data: Option<Payload>,
        config: Option<RequestConfig>,
    ) -> Result<F::Output, ApiError>
    where
        F: ResponseFormat,
    {
        let body = self.call_with(args, data, config).await?;
        Ok(F::parse(body).await?)
    }
}

/// One entry of a bulk registration.
#[derive(Debug, Clone)]
pub enum EndpointSpec {
    /// A URL using the group's method and default options.
    Url(String),
    /// A URL with its own method and options.
    Detailed {
        /// URL under the group prefix; absent means the prefix itself.
        url: Option<String>,
        /// Method override.
        method: Option<RestMethod>,
        /// Options laid over the group defaults.
        options: RequestConfig,
    },
}

impl EndpointSpec {
    /// Starts a detailed entry for `url`.
    pub fn detailed(url: impl Into<String>) -> Self {
        Self::Detailed {
            url: Some(url.into()),
            method: None,
            options: RequestConfig::new(),
        }
    }

    /// Overrides the method.
    pub fn method(self, method: RestMethod) -> Self {
        match self.into_detailed() {
            Self::Detailed { url, options, .. } => Self::Detailed {
                url,
                method: Some(method),
                options,
            },
            url => url,
        }
    }

    /// Sets the options laid over the group defaults.
    pub fn options(self, options: RequestConfig) -> Self {
        match self.into_detailed() {
            Self::Detailed { url, method, .. } => Self::Detailed {
                url,
                method,
                options,
            },
            url => url,
        }
    }

    fn into_detailed(self) -> Self {
        match self {
            Self::Url(url) => Self::detailed(url),
            detailed => detailed,
        }
    }

    /// Reads an entry from JSON.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidEndpointSpec`] unless `value` is a
    /// string or an object whose `url` and `method`, when present, are
    /// strings.
    pub fn from_value(name: &str, value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(url) => Ok(Self::Url(url.clone())),
            Value::Object(fields) => {
                let mut fields = fields.clone();
                let url = match fields.remove("url") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(url)) => Some(url),
                    Some(_) => return Err(ConfigError::invalid_endpoint(name)),
                };
                let method = match fields.remove("method") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(method)) => Some(RestMethod::from_name(&method)),
                    Some(_) => return Err(ConfigError::invalid_endpoint(name)),
                };
                Ok(Self::Detailed {
                    url,
                    method,
                    options: RequestConfig::from_json(&fields),
                })
            }
            _ => Err(ConfigError::invalid_endpoint(name)),
        }
    }
}

impl From<&str> for EndpointSpec {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for EndpointSpec {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

/// Endpoints returned by [`ApiClient::registry_all`], in registration order.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    entries: Vec<(EndpointId, Endpoint)>,
}

impl Endpoints {
    pub(crate) fn insert(&mut self, id: EndpointId, endpoint: Endpoint) {
        self.entries.push((id, endpoint));
    }

    /// Returns `true` if an endpoint is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up an endpoint by name.
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == name)
            .map(|(_, endpoint)| endpoint)
    }

    /// Returns the names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Iterates `(name, endpoint)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&EndpointId, &Endpoint)> {
        self.entries.iter().map(|(id, endpoint)| (id, endpoint))
    }

    /// Returns the number of endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Index<&str> for Endpoints {
    type Output = Endpoint;

    /// ## Panics
    ///
    /// Panics if no endpoint is registered under `name`.
    fn index(&self, name: &str) -> &Endpoint {
        match self.get(name) {
            Some(endpoint) => endpoint,
            None => panic!("no endpoint registered as {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use std::time::Duration;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(ClientConfig::builder(base).build().unwrap()).unwrap()
    }

    #[test]
    fn test_placeholders() {
        let template = UrlTemplate::from("/users/{id}/{}/posts/{post_id}/{unclosed");
        assert_eq!(template.placeholders(), vec!["id", "post_id"]);
        assert!(UrlTemplate::builder(|_| String::new()).placeholders().is_empty());
    }

    #[test]
    fn test_render_leaves_missing_placeholders() {
        let template = UrlTemplate::from("/users/{id}/{tab}");
        assert_eq!(template.render(&[("id", "1")]), "/users/1/{tab}");
    }

    #[test]
    fn test_url_composes_base() {
        let api = client("http://api.local/v1/");
        assert_eq!(api.get("/users", RequestConfig::new()).url(), "http://api.local/v1/users");
        assert_eq!(
            api.get("https://other.local/x", RequestConfig::new()).url(),
            "https://other.local/x"
        );
        assert_eq!(
            api.get(UrlTemplate::builder(|args| format!("users/{}", args[0].1)), RequestConfig::new())
                .url_with(&[("id", "9")]),
            "http://api.local/v1/users/9"
        );
    }

    #[test]
    fn test_registry_splits_presets() {
        let api = client("http://api.local");
        let endpoint = api.post(
            "/users",
            RequestConfig::new()
                .param("v", 1)
                .data_field("owner", "preset")
                .timeout(Duration::from_secs(2)),
        );
        assert_eq!(endpoint.preset_params()["v"], json!(1));
        assert_eq!(endpoint.preset_data()["owner"], json!("preset"));

        let options = endpoint.prepare(&[], Some(json!({"name": "ann"}).into()), None);
        assert_eq!(options.timeout, Some(Duration::from_secs(2)));
        assert_eq!(
            Value::Object(options.data.unwrap().as_fields().unwrap().clone()),
            json!({"owner": "preset", "name": "ann"})
        );
        assert_eq!(options.params.as_fields().unwrap()["v"], json!(1));
    }

    #[test]
    fn test_prepare_get_moves_data_to_params() {
        let api = client("http://api.local");
        let endpoint = api.get("/users/{id}", RequestConfig::new().param("lang", "en"));

        let options = endpoint.prepare(&[("id", "5")], Some(json!({"q": "x"}).into()), None);
        assert_eq!(options.url, "/users/5");
        assert!(options.data.is_none());
        assert_eq!(
            Value::Object(options.params.as_fields().unwrap().clone()),
            json!({"lang": "en", "q": "x"})
        );
    }

    #[test]
    fn test_spec_builders() {
        let spec = EndpointSpec::from("/save").method(RestMethod::Post);
        assert!(matches!(
            spec,
            EndpointSpec::Detailed { url: Some(ref url), method: Some(RestMethod::Post), .. } if url == "/save"
        ));
    }

    #[test]
    fn test_spec_from_value() {
        assert!(matches!(
            EndpointSpec::from_value("a", &json!("/a")),
            Ok(EndpointSpec::Url(_))
        ));

        let detailed = EndpointSpec::from_value("b", &json!({"method": "put", "timeout": 100})).unwrap();
        match detailed {
            EndpointSpec::Detailed { url, method, options } => {
                assert!(url.is_none());
                assert_eq!(method, Some(RestMethod::Put));
                assert_eq!(options.timeout, Some(Duration::from_millis(100)));
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(EndpointSpec::from_value("c", &json!(["/c"])).is_err());
        assert!(EndpointSpec::from_value("d", &json!({"url": 1})).is_err());
    }
}
