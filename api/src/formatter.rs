//! Form-urlencoded body formatting.

use serde_json::Value;
use url::form_urlencoded;

use crate::options::{ContentKind, RequestOptions};
use crate::payload::{Params, Payload};
use crate::urls::param_to_string;

/// Content-Type header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// MIME type of form submissions.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Encodes a body as form data when the request asks for it.
///
/// If the `Content-Type` header (any case) contains
/// `application/x-www-form-urlencoded`, or no `Content-Type` is set and the
/// [`ContentKind::Form`] shortcut is, mapping data is replaced with its
/// [`stringify`]d form. The shortcut path also sets the header, even without
/// a body, but never on multipart data, which carries its own boundary
/// header. Anything else passes through unchanged.
///
/// ## Examples
///
/// ```rust
/// use api_factory::{ContentKind, Payload, RequestOptions, RestMethod};
/// use api_factory::formatter::content_formatter;
/// use serde_json::json;
///
/// let mut options = RequestOptions::new(RestMethod::Post, "/login");
/// options.content_type = Some(ContentKind::Form);
/// options.data = Some(Payload::from(json!({"user": "ann"})));
///
/// let options = content_formatter(options);
/// assert_eq!(options.header("content-type"), Some("application/x-www-form-urlencoded"));
/// assert_eq!(options.data.as_ref().and_then(Payload::as_encoded), Some("user=ann"));
/// ```
pub fn content_formatter(mut options: RequestOptions) -> RequestOptions {
    let declared = options.header(CONTENT_TYPE).map(str::to_ascii_lowercase);

    match declared {
        Some(content_type) if content_type.contains(FORM_URLENCODED) => {
            encode_data(&mut options);
        }
        None if options.content_type == Some(ContentKind::Form)
            && !matches!(options.data, Some(Payload::Multipart(_))) =>
        {
            options.set_header(CONTENT_TYPE, FORM_URLENCODED);
            encode_data(&mut options);
        }
        _ => {}
    }

    options
}

fn encode_data(options: &mut RequestOptions) {
    if let Some(Payload::Fields(data)) = &options.data {
        options.data = Some(Payload::Encoded(stringify(data)));
    }
}

/// Serializes a mapping as `application/x-www-form-urlencoded`.
///
/// Nested values use bracket keys: objects as `a[b]=1`, arrays as
/// `a[0]=x`. Nulls encode as empty values.
pub fn stringify(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_pair(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_pair(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            serializer.append_pair(key, "");
        }
        Value::Object(map) => {
            for (child, value) in map {
                append_pair(serializer, &format!("{key}[{child}]"), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                append_pair(serializer, &format!("{key}[{index}]"), value);
            }
        }
        scalar => {
            serializer.append_pair(key, &param_to_string(scalar));
        }
    }
}
