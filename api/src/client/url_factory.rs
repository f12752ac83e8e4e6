//! URL-only factories.
//!
//! Some links are fixed paths whose base URL changes per deployment, such as
//! download links. A [`UrlFactory`] composes them from the client's base URL
//! without sending anything.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::client::endpoint::UrlBuilder;
use crate::error::ConfigError;
use crate::payload::Params;
use crate::urls::{concat_urls, merge_url_params};

/// What a [`UrlFactory`] appends to the base URL.
#[derive(Clone)]
pub enum UrlSpec {
    /// A fixed path.
    Path(String),
    /// A path built from arguments.
    Builder(UrlBuilder),
    /// Nothing; the factory yields the bare base URL.
    None,
}

impl UrlSpec {
    /// Wraps a URL builder closure.
    pub fn builder<F>(f: F) -> Self
    where
        F: Fn(&[(&str, &str)]) -> String + Send + Sync + 'static,
    {
        Self::Builder(Arc::new(f))
    }
}

impl fmt::Debug for UrlSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Builder(_) => f.write_str("Builder(..)"),
            Self::None => f.write_str("None"),
        }
    }
}

impl From<&str> for UrlSpec {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for UrlSpec {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl<T: Into<UrlSpec>> From<Option<T>> for UrlSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(Self::None, Into::into)
    }
}

impl TryFrom<&Value> for UrlSpec {
    type Error = ConfigError;

    /// Strings become paths, the empty string included; `null`, `false` and
    /// `0` mean no path.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidUrlSpec`] for any other value.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(path) => Ok(Self::Path(path.clone())),
            Value::Null | Value::Bool(false) => Ok(Self::None),
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(Self::None),
            other => Err(ConfigError::invalid_url_spec(other.to_string())),
        }
    }
}

/// Composes URLs under a fixed base URL.
#[derive(Debug, Clone)]
pub struct UrlFactory {
    base_url: String,
    spec: UrlSpec,
}

impl UrlFactory {
    pub(crate) fn new(base_url: impl Into<String>, spec: UrlSpec) -> Self {
        Self {
            base_url: base_url.into(),
            spec,
        }
    }

    /// Returns the URL, with `params` appended as a query string.
    pub fn url(&self, params: Option<&Params>) -> String {
        self.url_with(&[], params)
    }

    /// Returns the URL built from `args`, with `params` appended as a query
    /// string.
    ///
    /// [`UrlSpec::None`] ignores both and returns the base URL.
    pub fn url_with(&self, args: &[(&str, &str)], params: Option<&Params>) -> String {
        let path = match &self.spec {
            UrlSpec::Path(path) => path.clone(),
            UrlSpec::Builder(build) => build(args),
            UrlSpec::None => return self.base_url.clone(),
        };
        merge_url_params(&concat_urls([self.base_url.as_str(), path.as_str()]), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://cdn.local/ctx";

    #[test]
    fn test_path_with_params() {
        let factory = UrlFactory::new(BASE, UrlSpec::from("/download"));
        assert_eq!(factory.url(None), "http://cdn.local/ctx/download");

        let params = json!({"id": 7, "kind": "pdf"});
        assert_eq!(
            factory.url(params.as_object()),
            "http://cdn.local/ctx/download?id=7&kind=pdf"
        );
    }

    #[test]
    fn test_builder_receives_args() {
        let factory = UrlFactory::new(
            BASE,
            UrlSpec::builder(|args| format!("files/{}", args[0].1)),
        );
        let params = json!({"inline": true});
        assert_eq!(
            factory.url_with(&[("name", "a.txt")], params.as_object()),
            "http://cdn.local/ctx/files/a.txt?inline=true"
        );
    }

    #[test]
    fn test_none_yields_base() {
        let factory = UrlFactory::new(BASE, UrlSpec::None);
        let params = json!({"ignored": 1});
        assert_eq!(factory.url(params.as_object()), BASE);
        assert_eq!(UrlFactory::new(BASE, UrlSpec::from(None::<&str>)).url(None), BASE);
    }

    #[test]
    fn test_empty_path_still_joins_and_appends_params() {
        let params = json!({"id": 7});
        let from_value = UrlFactory::new(BASE, UrlSpec::try_from(&json!("")).unwrap());
        let from_str = UrlFactory::new(BASE, UrlSpec::from(""));

        assert_eq!(from_value.url(params.as_object()), "http://cdn.local/ctx/?id=7");
        assert_eq!(from_value.url(params.as_object()), from_str.url(params.as_object()));
    }

    #[test]
    fn test_try_from_value() {
        assert!(matches!(UrlSpec::try_from(&json!("/a")), Ok(UrlSpec::Path(_))));
        assert!(matches!(UrlSpec::try_from(&json!(null)), Ok(UrlSpec::None)));
        assert!(matches!(UrlSpec::try_from(&json!(false)), Ok(UrlSpec::None)));
        assert!(matches!(UrlSpec::try_from(&json!(0)), Ok(UrlSpec::None)));
        assert!(matches!(UrlSpec::try_from(&json!("")), Ok(UrlSpec::Path(p)) if p.is_empty()));

        let err = UrlSpec::try_from(&json!(42)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrlSpec { .. }));
        assert_eq!(err.to_string(), "Unknown URL type: 42");
        assert!(UrlSpec::try_from(&json!({"url": "/a"})).is_err());
    }
}
