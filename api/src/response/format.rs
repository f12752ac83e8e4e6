//! Response format trait and implementations.

use std::future::Future;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ValidationError;

/// Decodes a response body.
///
/// ## Examples
///
/// ```rust
/// use api_factory::response::{JsonFormat, ResponseFormat};
///
/// #[derive(serde::Deserialize)]
/// struct Token { access_token: String }
///
/// # async fn run() -> Result<(), api_factory::ValidationError> {
/// let body = bytes::Bytes::from_static(br#"{"access_token": "t"}"#);
/// let token = JsonFormat::<Token>::parse(body).await?;
/// assert_eq!(token.access_token, "t");
/// # Ok(())
/// # }
/// ```
pub trait ResponseFormat: Send + Sync {
    /// The decoded value.
    type Output: Send;

    /// Decodes `body`.
    fn parse(body: Bytes) -> impl Future<Output = Result<Self::Output, ValidationError>> + Send;

    /// The Content-Type this format expects.
    fn content_type() -> &'static str;
}

/// JSON deserialized into `T`.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send + Sync> ResponseFormat for JsonFormat<T> {
    type Output = T;

    async fn parse(body: Bytes) -> Result<Self::Output, ValidationError> {
        serde_json::from_slice(&body).map_err(ValidationError::JsonParse)
    }

    fn content_type() -> &'static str {
        "application/json"
    }
}

/// YAML deserialized into `T`.
#[derive(Debug, Clone, Copy)]
pub struct YamlFormat<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send + Sync> ResponseFormat for YamlFormat<T> {
    type Output = T;

    async fn parse(body: Bytes) -> Result<Self::Output, ValidationError> {
        serde_yaml::from_slice(&body).map_err(ValidationError::YamlParse)
    }

    fn content_type() -> &'static str {
        "application/yaml"
    }
}

/// XML deserialized into `T`.
#[derive(Debug, Clone, Copy)]
pub struct XmlFormat<T>(PhantomData<T>);

impl<T: DeserializeOwned + Send + Sync> ResponseFormat for XmlFormat<T> {
    type Output = T;

    async fn parse(body: Bytes) -> Result<Self::Output, ValidationError> {
        quick_xml::de::from_reader(body.as_ref()).map_err(ValidationError::XmlParse)
    }

    fn content_type() -> &'static str {
        "application/xml"
    }
}

/// The body as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormat;

impl ResponseFormat for PlainTextFormat {
    type Output = String;

    async fn parse(body: Bytes) -> Result<Self::Output, ValidationError> {
        std::str::from_utf8(&body)
            .map(str::to_owned)
            .map_err(|e| ValidationError::ContentTypeMismatch {
                expected: "valid UTF-8 text".to_string(),
                actual: format!("invalid UTF-8: {e}"),
            })
    }

    fn content_type() -> &'static str {
        "text/plain"
    }
}

/// The raw body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryFormat;

impl ResponseFormat for BinaryFormat {
    type Output = Bytes;

    async fn parse(body: Bytes) -> Result<Self::Output, ValidationError> {
        Ok(body)
    }

    fn content_type() -> &'static str {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    #[tokio::test]
    async fn test_json() {
        let user = JsonFormat::<User>::parse(Bytes::from(r#"{"id": 1, "name": "ann"}"#))
            .await
            .unwrap();
        assert_eq!(user, User { id: 1, name: "ann".to_string() });

        let err = JsonFormat::<User>::parse(Bytes::from("ok")).await.unwrap_err();
        assert!(matches!(err, ValidationError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_yaml() {
        let user = YamlFormat::<User>::parse(Bytes::from("id: 2\nname: bob"))
            .await
            .unwrap();
        assert_eq!(user.id, 2);
    }

    #[tokio::test]
    async fn test_xml() {
        let user = XmlFormat::<User>::parse(Bytes::from("<user><id>3</id><name>cy</name></user>"))
            .await
            .unwrap();
        assert_eq!(user.name, "cy");
    }

    #[tokio::test]
    async fn test_plain_text_rejects_invalid_utf8() {
        assert_eq!(PlainTextFormat::parse(Bytes::from("hi")).await.unwrap(), "hi");

        let err = PlainTextFormat::parse(Bytes::from_static(&[0xff, 0xfe]))
            .await
            .unwrap_err();
        assert!(err.is_format_mismatch());
    }

    #[tokio::test]
    async fn test_binary_is_untouched() {
        let body = Bytes::from_static(&[0, 1, 2, 255]);
        assert_eq!(BinaryFormat::parse(body.clone()).await.unwrap(), body);
    }
}
