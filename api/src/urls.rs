//! URL composition helpers.
//!
//! These operate on plain strings rather than [`url::Url`] so that relative
//! fragments and path templates such as `/users/{id}` can be joined before
//! any parsing happens.

use serde_json::Value;

use crate::payload::Params;

/// Joins URL fragments left to right with exactly one slash at each join.
///
/// Any run of slashes where two fragments meet collapses into one; when
/// neither side has one, a slash is inserted. Slashes away from the join are
/// left alone, and empty fragments are joined like any other fragment.
///
/// ## Examples
///
/// ```rust
/// use api_factory::urls::concat_urls;
///
/// assert_eq!(concat_urls(["http://x/", "/y"]), "http://x/y");
/// assert_eq!(concat_urls(["http://x", "y"]), "http://x/y");
/// assert_eq!(concat_urls(["http://x//", "//y"]), "http://x/y");
/// assert_eq!(concat_urls(["http://x", "user", "/all"]), "http://x/user/all");
/// ```
pub fn concat_urls<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fragments = fragments.into_iter();
    let mut result = match fragments.next() {
        Some(first) => first.as_ref().to_string(),
        None => return String::new(),
    };

    for fragment in fragments {
        result.truncate(result.trim_end_matches('/').len());
        result.push('/');
        result.push_str(fragment.as_ref().trim_start_matches('/'));
    }

    result
}

/// Appends `params` to `url` as a query string.
///
/// Absent or empty params leave the url unchanged. Pairs are emitted in the
/// mapping's order and values are coerced with [`param_to_string`]. No
/// percent-encoding is applied.
pub fn merge_url_params(url: &str, params: Option<&Params>) -> String {
    match params {
        Some(params) if !params.is_empty() => {
            let query = params
                .iter()
                .map(|(key, value)| format!("{key}={}", param_to_string(value)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{url}?{query}")
        }
        _ => url.to_string(),
    }
}

/// Coerces a parameter value to its query-string form.
///
/// Strings are used raw, arrays are comma-joined and objects are rendered as
/// JSON.
pub fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(param_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Returns `true` if `url` carries its own scheme and should not be joined
/// onto a base URL.
pub fn is_absolute(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => url.starts_with("//"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_concat_slash_combinations() {
        assert_eq!(concat_urls(["http://x/", "/y"]), "http://x/y");
        assert_eq!(concat_urls(["http://x", "y"]), "http://x/y");
        assert_eq!(concat_urls(["http://x/", "y"]), "http://x/y");
        assert_eq!(concat_urls(["http://x", "/y"]), "http://x/y");
    }

    #[test]
    fn test_concat_collapses_slash_runs_at_join() {
        assert_eq!(concat_urls(["http://x//", "//y"]), "http://x/y");
        assert_eq!(concat_urls(["http://x/", "//y"]), "http://x/y");
        assert_eq!(concat_urls(["http://x///", "y"]), "http://x/y");
        assert_eq!(concat_urls(["http://x//a", "b//c//", "//d"]), "http://x//a/b//c/d");
    }

    #[test]
    fn test_concat_many_fragments() {
        assert_eq!(
            concat_urls(["http://localhost:8080/ctx", "/user/", "/all"]),
            "http://localhost:8080/ctx/user/all"
        );
    }

    #[test]
    fn test_concat_preserves_fragment_content() {
        let joined = concat_urls(["http://x/a?b=1", "c/d/"]);
        assert_eq!(joined, "http://x/a?b=1/c/d/");
    }

    #[test]
    fn test_concat_empty_fragments_are_present() {
        assert_eq!(concat_urls(["http://x", ""]), "http://x/");
        assert_eq!(concat_urls(["", "y"]), "/y");
        assert_eq!(concat_urls(["http://x/", ""]), "http://x/");
    }

    #[test]
    fn test_concat_single_and_none() {
        assert_eq!(concat_urls(["only"]), "only");
        assert_eq!(concat_urls(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_merge_url_params_absent_or_empty() {
        assert_eq!(merge_url_params("http://x/y", None), "http://x/y");
        assert_eq!(merge_url_params("http://x/y", Some(&Params::new())), "http://x/y");
    }

    #[test]
    fn test_merge_url_params_order_and_coercion() {
        let p = params(json!({"b": 2, "a": "x y", "flag": true, "ids": [1, 2], "none": null}));
        assert_eq!(
            merge_url_params("http://x/y", Some(&p)),
            "http://x/y?b=2&a=x y&flag=true&ids=1,2&none=null"
        );
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("https://api.example.com/x"));
        assert!(is_absolute("//cdn.example.com/x"));
        assert!(!is_absolute("/users"));
        assert!(!is_absolute("users/{id}"));
        assert!(!is_absolute("/redirect?to=http://x"));
    }
}
