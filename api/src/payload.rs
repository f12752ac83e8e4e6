//! Request payload types.
//!
//! A request's params and data are either a plain key/value mapping, a
//! multipart form that must be passed through untouched, or a body that has
//! already been encoded. The caller picks the variant; nothing downstream
//! inspects payload shapes at runtime.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

/// Insertion-ordered key/value mapping used for query params and bodies.
pub type Params = serde_json::Map<String, Value>;

/// A request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain mapping; merged key-wise with other layers.
    Fields(Params),
    /// Multipart form; never merged.
    Multipart(MultipartForm),
    /// Pre-encoded body text, such as a form-urlencoded string.
    Encoded(String),
}

impl Payload {
    /// Builds a [`Payload::Fields`] from a JSON object.
    ///
    /// Non-object values are wrapped under a `"value"` key.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Fields(map),
            Value::Null => Self::Fields(Params::new()),
            other => {
                let mut map = Params::new();
                map.insert("value".to_string(), other);
                Self::Fields(map)
            }
        }
    }

    /// Returns the mapping if this is a [`Payload::Fields`].
    pub fn as_fields(&self) -> Option<&Params> {
        match self {
            Self::Fields(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the form if this is a [`Payload::Multipart`].
    pub fn as_multipart(&self) -> Option<&MultipartForm> {
        match self {
            Self::Multipart(form) => Some(form),
            _ => None,
        }
    }

    /// Returns the encoded body if this is a [`Payload::Encoded`].
    pub fn as_encoded(&self) -> Option<&str> {
        match self {
            Self::Encoded(body) => Some(body),
            _ => None,
        }
    }

    /// Returns `true` for an empty mapping.
    pub fn is_empty_fields(&self) -> bool {
        matches!(self, Self::Fields(map) if map.is_empty())
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Fields(Params::new())
    }
}

impl From<Params> for Payload {
    fn from(map: Params) -> Self {
        Self::Fields(map)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<MultipartForm> for Payload {
    fn from(form: MultipartForm) -> Self {
        Self::Multipart(form)
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File upload field.
    File {
        /// Field name.
        name: String,
        /// File name sent in Content-Disposition.
        file_name: String,
        /// MIME type of the content, if known.
        mime: Option<String>,
        /// File content.
        content: Bytes,
    },
}

impl FormPart {
    /// Returns the field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// A multipart form shared by handle.
///
/// Clones share the same parts, so a form passed into a request is the same
/// form the transport sends ([`MultipartForm::ptr_eq`]).
///
/// ## Examples
///
/// ```rust
/// use api_factory::MultipartForm;
///
/// let form = MultipartForm::builder()
///     .text("title", "avatar")
///     .file("file", "me.png", Some("image/png"), vec![0x89, 0x50])
///     .build();
///
/// assert_eq!(form.parts().len(), 2);
/// assert!(form.ptr_eq(&form.clone()));
/// ```
#[derive(Debug, Clone)]
pub struct MultipartForm {
    parts: Arc<Vec<FormPart>>,
}

impl MultipartForm {
    /// Creates a form builder.
    pub fn builder() -> MultipartFormBuilder {
        MultipartFormBuilder::default()
    }

    /// Returns the form parts in insertion order.
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Returns `true` if both handles refer to the same form.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.parts, &other.parts)
    }

    /// Returns the text fields as name/value pairs, skipping files.
    pub fn text_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts.iter().filter_map(|part| match part {
            FormPart::Text { name, value } => Some((name.as_str(), value.as_str())),
            FormPart::File { .. } => None,
        })
    }

    /// Converts into a `reqwest` multipart form.
    pub fn to_reqwest(&self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts.iter() {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    content,
                } => {
                    let mut file = reqwest::multipart::Part::bytes(content.to_vec())
                        .file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime)?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

impl PartialEq for MultipartForm {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.parts == other.parts
    }
}

/// Builder for [`MultipartForm`].
#[derive(Debug, Default)]
pub struct MultipartFormBuilder {
    parts: Vec<FormPart>,
}

impl MultipartFormBuilder {
    /// Adds a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        content: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            content: content.into(),
        });
        self
    }

    /// Builds the form.
    pub fn build(self) -> MultipartForm {
        MultipartForm {
            parts: Arc::new(self.parts),
        }
    }
}
