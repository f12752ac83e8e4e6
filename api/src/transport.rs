//! The HTTP transport seam.
//!
//! [`Transport`] is the only place a request touches the network. The
//! default implementation wraps `reqwest::Client`; tests and callers can swap
//! in their own via [`ApiClient::set_transport`](crate::ApiClient::set_transport).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError};
use crate::formatter::FORM_URLENCODED;
use crate::options::RequestOptions;
use crate::payload::Payload;
use crate::urls::param_to_string;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Boxed future returned by transports and async hooks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends fully assembled requests.
///
/// Implementations resolve with the response for 2xx statuses and fail with
/// [`ClientError::HttpStatus`] for any other status a server answers with.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends one request.
    fn request(&self, options: RequestOptions) -> BoxFuture<'_, Result<TransportResponse, ClientError>>;
}

/// A successful response.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub data: Bytes,
}

impl TransportResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, data: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            data: data.into(),
        }
    }
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport from client settings.
    ///
    /// Settings headers become default headers and the settings timeout, or
    /// 30 seconds, becomes the client timeout.
    ///
    /// ## Errors
    ///
    /// Returns an error if a settings header is invalid or the HTTP client
    /// cannot be constructed.
    pub fn create(config: &ClientConfig) -> Result<Self, ConfigError> {
        let settings = config.settings();

        let mut default_headers = HeaderMap::new();
        for (name, value) in settings.headers.iter().flatten() {
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            default_headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(
                settings
                    .timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )
            .default_headers(default_headers)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ConfigError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Translates options into a `reqwest` request.
    fn build_request(&self, options: &RequestOptions) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = options.full_url();
        let mut request = self.client.request(options.method.to_reqwest(), url.as_str());

        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        match &options.params {
            Payload::Fields(params) if !params.is_empty() => {
                let pairs: Vec<(String, String)> = params
                    .iter()
                    .map(|(k, v)| (k.clone(), param_to_string(v)))
                    .collect();
                request = request.query(&pairs);
            }
            Payload::Fields(_) => {}
            Payload::Multipart(form) => {
                let skipped = form.parts().len() - form.text_fields().count();
                if skipped > 0 {
                    warn!(url = %url, skipped, "file parts cannot be sent as query params");
                }
                let pairs: Vec<(&str, &str)> = form.text_fields().collect();
                request = request.query(&pairs);
            }
            Payload::Encoded(query) => {
                let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect();
                request = request.query(&pairs);
            }
        }

        match &options.data {
            Some(Payload::Fields(data)) => request = request.json(data),
            Some(Payload::Encoded(body)) => {
                if options.header(CONTENT_TYPE.as_str()).is_none() {
                    request = request.header(CONTENT_TYPE, FORM_URLENCODED);
                }
                request = request.body(body.clone());
            }
            Some(Payload::Multipart(form)) => request = request.multipart(form.to_reqwest()?),
            None => {}
        }

        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        Ok(request)
    }
}

impl Transport for ReqwestTransport {
    fn request(&self, options: RequestOptions) -> BoxFuture<'_, Result<TransportResponse, ClientError>> {
        Box::pin(async move {
            let request = self.build_request(&options)?;
            debug!(method = %options.method, url = %options.full_url(), "sending request");

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout {
                        duration_ms: options
                            .timeout
                            .map(|t| t.as_millis() as u64)
                            .unwrap_or(DEFAULT_TIMEOUT_SECS * 1000),
                    }
                } else if e.is_connect() {
                    ClientError::Connection(e.to_string())
                } else {
                    ClientError::Request(e)
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                // hyper only records the phrase when it differs from the canonical one
                let reason = response
                    .extensions()
                    .get::<ReasonPhrase>()
                    .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
                    .map(str::to_string);
                let body = response.text().await.unwrap_or_default();
                return Err(ClientError::http_status_with_reason(
                    status.as_u16(),
                    reason,
                    body,
                ));
            }

            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
                .collect();
            let data = response.bytes().await.map_err(ClientError::Request)?;

            Ok(TransportResponse {
                status: status.as_u16(),
                headers,
                data,
            })
        })
    }
}
