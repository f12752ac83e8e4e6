//! HTTP method types for REST APIs.

use std::fmt;

use strum::{EnumIter, EnumString};

/// Methods whose requests carry everything as query parameters.
const BODYLESS_METHODS: &str = "GET,HEAD,DELETE";

/// HTTP methods for REST API endpoints.
///
/// Any method name outside the standard set parses into
/// [`RestMethod::Custom`], so registration never fails on an unusual verb.
///
/// ## Examples
///
/// ```rust
/// use api_factory::RestMethod;
///
/// let method = RestMethod::Get;
/// assert!(!method.has_body());
///
/// // Names are uppercased before parsing
/// assert_eq!(RestMethod::from_name("post"), RestMethod::Post);
/// assert_eq!(RestMethod::from_name("purge"), RestMethod::Custom("PURGE".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    /// HTTP GET - Retrieve a resource.
    #[default]
    Get,
    /// HTTP POST - Create a resource or trigger an action.
    Post,
    /// HTTP PUT - Replace a resource entirely.
    Put,
    /// HTTP PATCH - Partially update a resource.
    Patch,
    /// HTTP DELETE - Remove a resource.
    Delete,
    /// HTTP HEAD - Retrieve headers only.
    Head,
    /// HTTP OPTIONS - Query supported methods.
    Options,
    /// HTTP TRACE - Echo the request for debugging.
    Trace,
    /// Any other method, stored uppercased.
    #[strum(default)]
    Custom(String),
}

impl RestMethod {
    /// Parses a method name case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let upper = name.to_uppercase();
        match upper.parse() {
            Ok(method) => method,
            Err(_) => Self::Custom(upper),
        }
    }

    /// Returns the uppercase method name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Custom(name) => name,
        }
    }

    /// Returns `true` if requests with this method send their data as a body.
    ///
    /// GET, HEAD and DELETE carry data as query parameters; every other
    /// method is body-bearing. Custom methods are tested by substring against
    /// `"GET,HEAD,DELETE"`, so a fragment such as `"ET"` also counts as
    /// body-less.
    pub fn has_body(&self) -> bool {
        match self {
            Self::Get | Self::Head | Self::Delete => false,
            Self::Custom(name) => !BODYLESS_METHODS.contains(name.as_str()),
            _ => true,
        }
    }

    /// Converts to the equivalent `reqwest::Method`.
    ///
    /// Custom names that are not valid HTTP tokens fall back to GET.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Trace => reqwest::Method::TRACE,
            Self::Custom(name) => {
                reqwest::Method::from_bytes(name.as_bytes()).unwrap_or(reqwest::Method::GET)
            }
        }
    }
}

impl fmt::Display for RestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}
