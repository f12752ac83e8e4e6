//! Request option layering.
//!
//! A request is assembled from several configuration layers. Lowest to
//! highest precedence:
//!
//! 1. client settings ([`ClientConfig::settings`](crate::ClientConfig::settings))
//! 2. the endpoint's URL and method
//! 3. endpoint options passed to [`ApiClient::registry`](crate::ApiClient::registry)
//! 4. per-call [`RequestConfig`]
//! 5. params and data merged by [`merge_for_request`]
//!
//! Layers are shallow: a `headers` list set on a higher layer replaces the
//! lower layer's list instead of merging into it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::dispatch::{ErrorDefaults, ErrorMatchers};
use crate::method::RestMethod;
use crate::payload::{Params, Payload};
use crate::transport::Transport;
use crate::urls::{concat_urls, is_absolute};

/// Shortcut for declaring a request's content type without a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Send data as `application/x-www-form-urlencoded`.
    Form,
    /// Send data as JSON (the transport default).
    Json,
}

/// A layer of request configuration.
///
/// Used for client settings, endpoint options and per-call overrides. Unset
/// fields leave lower layers untouched.
///
/// ## Examples
///
/// ```rust
/// use std::time::Duration;
/// use api_factory::RequestConfig;
///
/// let config = RequestConfig::new()
///     .header("X-Trace", "on")
///     .timeout(Duration::from_secs(5))
///     .param("page", 2);
/// assert_eq!(config.params.as_ref().unwrap()["page"], 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Request headers. Replaces lower layers' headers entirely.
    pub headers: Option<Vec<(String, String)>>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Content type shortcut.
    pub content_type: Option<ContentKind>,
    /// Query params layer.
    pub params: Option<Params>,
    /// Data layer.
    pub data: Option<Params>,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Passthrough options, merged key by key.
    pub extra: Params,
    /// Error defaults replacing the client-level overrides for this request.
    pub error_defaults: Option<ErrorDefaults>,
    /// Error matchers merged over the client-level matchers.
    pub error_matchers: Option<ErrorMatchers>,
    /// Transport to use instead of the client's.
    pub transport: Option<Arc<dyn Transport>>,
}

impl RequestConfig {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to this layer.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let headers = self.headers.get_or_insert_with(Vec::new);
        set_header(headers, name.into(), value.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the content type shortcut.
    pub fn content_type(mut self, kind: ContentKind) -> Self {
        self.content_type = Some(kind);
        self
    }

    /// Adds a query param.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces the params layer.
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Adds a data field.
    pub fn data_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces the data layer.
    pub fn data(mut self, data: Params) -> Self {
        self.data = Some(data);
        self
    }

    /// Overrides the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a passthrough option.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Sets error defaults for requests using this layer.
    pub fn error_defaults(mut self, defaults: ErrorDefaults) -> Self {
        self.error_defaults = Some(defaults);
        self
    }

    /// Sets error matchers for requests using this layer.
    pub fn error_matchers(mut self, matchers: ErrorMatchers) -> Self {
        self.error_matchers = Some(matchers);
        self
    }

    /// Routes requests using this layer through `transport`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds a layer from a JSON object.
    ///
    /// Recognized keys are `headers` (object of strings), `timeout`
    /// (milliseconds), `contentType` (`"form"` or `"json"`), `params`, `data`
    /// and `baseURL`. Anything else, including recognized keys with an
    /// unexpected shape, is kept as a passthrough option.
    pub fn from_json(map: &Params) -> Self {
        let mut config = Self::new();
        for (key, value) in map {
            match (key.as_str(), value) {
                ("headers", Value::Object(headers)) => {
                    for (name, value) in headers {
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        config = config.header(name.clone(), value);
                    }
                }
                ("timeout", Value::Number(ms)) if ms.as_u64().is_some() => {
                    config.timeout = ms.as_u64().map(Duration::from_millis);
                }
                ("contentType", Value::String(kind)) if kind == "form" => {
                    config.content_type = Some(ContentKind::Form);
                }
                ("contentType", Value::String(kind)) if kind == "json" => {
                    config.content_type = Some(ContentKind::Json);
                }
                ("params", Value::Object(params)) => config.params = Some(params.clone()),
                ("data", Value::Object(data)) => config.data = Some(data.clone()),
                ("baseURL", Value::String(url)) => config.base_url = Some(url.clone()),
                _ => {
                    config.extra.insert(key.clone(), value.clone());
                }
            }
        }
        config
    }

    /// Lays `top` over `self`; fields set in `top` win.
    pub fn overlay(mut self, top: RequestConfig) -> Self {
        if top.headers.is_some() {
            self.headers = top.headers;
        }
        if top.timeout.is_some() {
            self.timeout = top.timeout;
        }
        if top.content_type.is_some() {
            self.content_type = top.content_type;
        }
        if top.params.is_some() {
            self.params = top.params;
        }
        if top.data.is_some() {
            self.data = top.data;
        }
        if top.base_url.is_some() {
            self.base_url = top.base_url;
        }
        self.extra.extend(top.extra);
        if top.error_defaults.is_some() {
            self.error_defaults = top.error_defaults;
        }
        if top.error_matchers.is_some() {
            self.error_matchers = top.error_matchers;
        }
        if top.transport.is_some() {
            self.transport = top.transport;
        }
        self
    }

    /// Splits off the params and data layers, leaving the other options.
    pub fn split_payload(mut self) -> (Option<Params>, Option<Params>, Self) {
        let params = self.params.take();
        let data = self.data.take();
        (params, data, self)
    }
}

/// Fully assembled options for one request.
///
/// This is what pre-request hooks receive and what the
/// [`Transport`] sends.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Request URL, relative to `base_url` unless absolute.
    pub url: String,
    /// HTTP method.
    pub method: RestMethod,
    /// Base URL the request URL is joined onto.
    pub base_url: Option<String>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Query params.
    pub params: Payload,
    /// Request body; always `None` for body-less methods.
    pub data: Option<Payload>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Content type shortcut.
    pub content_type: Option<ContentKind>,
    /// Passthrough options.
    pub extra: Params,
    /// Per-request error defaults.
    pub error_defaults: Option<ErrorDefaults>,
    /// Per-request error matchers.
    pub error_matchers: Option<ErrorMatchers>,
    /// Transport override.
    pub transport: Option<Arc<dyn Transport>>,
}

impl RequestOptions {
    /// Creates options for `method` on `url` with everything else unset.
    pub fn new(method: RestMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Self::default()
        }
    }

    /// Applies the non-payload fields of a configuration layer.
    ///
    /// The layer's `params` and `data` are ignored; they are merged by
    /// [`merge_for_request`] instead.
    pub fn with_config(mut self, config: &RequestConfig) -> Self {
        if let Some(headers) = &config.headers {
            self.headers = headers.clone();
        }
        if config.timeout.is_some() {
            self.timeout = config.timeout;
        }
        if config.content_type.is_some() {
            self.content_type = config.content_type;
        }
        if config.base_url.is_some() {
            self.base_url = config.base_url.clone();
        }
        self.extra
            .extend(config.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        if config.error_defaults.is_some() {
            self.error_defaults = config.error_defaults.clone();
        }
        if config.error_matchers.is_some() {
            self.error_matchers = config.error_matchers.clone();
        }
        if config.transport.is_some() {
            self.transport = config.transport.clone();
        }
        self
    }

    /// Applies the result of [`merge_for_request`].
    pub fn with_merged(self, merged: MergedRequest) -> Self {
        let mut options = self.with_config(&merged.config);
        options.params = merged.params;
        options.data = merged.data;
        options
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing header with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    /// Returns the URL the transport should request.
    ///
    /// Absolute URLs are used as-is; others are joined onto `base_url`.
    pub fn full_url(&self) -> String {
        match &self.base_url {
            Some(base) if !is_absolute(&self.url) => concat_urls([base.as_str(), &self.url]),
            _ => self.url.clone(),
        }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
    headers.push((name, value));
}

/// Named param layers.
pub mod layer {
    /// Endpoint-level params.
    pub const PRESET_PARAMS: &str = "preset_params";
    /// Per-call config params.
    pub const CALL_PARAMS: &str = "call_params";
    /// Endpoint-level data.
    pub const PRESET_DATA: &str = "preset_data";
    /// Data passed to the call.
    pub const CALL_DATA: &str = "call_data";
    /// Per-call config data.
    pub const CALL_CONFIG_DATA: &str = "call_config_data";
}

/// Shallow merge of named mappings; later layers overwrite earlier keys.
///
/// ## Examples
///
/// ```rust
/// use api_factory::options::ParamLayers;
/// use serde_json::json;
///
/// let a = json!({"a": 1, "b": 1}).as_object().unwrap().clone();
/// let b = json!({"b": 2}).as_object().unwrap().clone();
///
/// let merged = ParamLayers::new().layer("a", Some(&a)).layer("b", Some(&b)).build();
/// assert_eq!(serde_json::Value::Object(merged), json!({"a": 1, "b": 2}));
/// ```
#[derive(Debug, Default)]
pub struct ParamLayers {
    merged: Params,
    applied: Vec<&'static str>,
}

impl ParamLayers {
    /// Starts with an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a layer. Absent layers are skipped.
    pub fn layer(mut self, name: &'static str, params: Option<&Params>) -> Self {
        if let Some(params) = params {
            for (key, value) in params {
                self.merged.insert(key.clone(), value.clone());
            }
            self.applied.push(name);
        }
        self
    }

    /// Returns the names of the layers applied so far.
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    /// Returns the merged mapping.
    pub fn build(self) -> Params {
        self.merged
    }
}

/// Output of [`merge_for_request`].
#[derive(Debug, Clone, Default)]
pub struct MergedRequest {
    /// The call config with its params and data removed.
    pub config: RequestConfig,
    /// Merged params.
    pub params: Payload,
    /// Merged data; `None` for body-less methods.
    pub data: Option<Payload>,
}

/// Merges endpoint presets with per-call data and config.
///
/// For body-less methods everything lands in the params:
/// `preset_params < call_config.params < preset_data < call_data <
/// call_config.data`, and the data is dropped. For body-bearing methods the
/// params are `preset_params < call_config.params` and the data is
/// `preset_data < call_data < call_config.data`.
///
/// A [`Payload::Multipart`] call payload is never merged: it becomes the
/// params of a body-less request or the data of a body-bearing one. Any
/// other non-mapping call payload is treated the same way.
pub fn merge_for_request(
    method: &RestMethod,
    call_data: Option<Payload>,
    call_config: Option<RequestConfig>,
    preset_params: &Params,
    preset_data: &Params,
) -> MergedRequest {
    let (config_params, config_data, config) = call_config.unwrap_or_default().split_payload();

    let call_fields = match call_data {
        Some(Payload::Fields(fields)) => Some(fields),
        None => None,
        Some(verbatim) => {
            debug!(method = %method, "call payload bypasses merging");
            return if method.has_body() {
                let params = ParamLayers::new()
                    .layer(layer::PRESET_PARAMS, Some(preset_params))
                    .layer(layer::CALL_PARAMS, config_params.as_ref())
                    .build();
                MergedRequest {
                    config,
                    params: Payload::Fields(params),
                    data: Some(verbatim),
                }
            } else {
                MergedRequest {
                    config,
                    params: verbatim,
                    data: None,
                }
            };
        }
    };

    if method.has_body() {
        let params = ParamLayers::new()
            .layer(layer::PRESET_PARAMS, Some(preset_params))
            .layer(layer::CALL_PARAMS, config_params.as_ref())
            .build();
        let data = ParamLayers::new()
            .layer(layer::PRESET_DATA, Some(preset_data))
            .layer(layer::CALL_DATA, call_fields.as_ref())
            .layer(layer::CALL_CONFIG_DATA, config_data.as_ref());
        debug!(method = %method, layers = ?data.applied(), "merged request body");
        MergedRequest {
            config,
            params: Payload::Fields(params),
            data: Some(Payload::Fields(data.build())),
        }
    } else {
        let params = ParamLayers::new()
            .layer(layer::PRESET_PARAMS, Some(preset_params))
            .layer(layer::CALL_PARAMS, config_params.as_ref())
            .layer(layer::PRESET_DATA, Some(preset_data))
            .layer(layer::CALL_DATA, call_fields.as_ref())
            .layer(layer::CALL_CONFIG_DATA, config_data.as_ref());
        debug!(method = %method, layers = ?params.applied(), "merged query params");
        MergedRequest {
            config,
            params: Payload::Fields(params.build()),
            data: None,
        }
    }
}
