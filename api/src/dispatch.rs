//! Error dispatch for failed requests.
//!
//! When a request fails, the [`ErrorDispatcher`] picks a handler in this
//! order, first match wins:
//!
//! 1. the status-code defaults, keyed by the response status
//! 2. the status-text defaults, keyed by the response reason phrase
//! 3. the matchers, scanned in order until one's predicate accepts the error
//!
//! Failures without an HTTP response skip the first two steps. The chosen
//! handler's return value becomes the request's error; without a handler the
//! original [`ClientError`] is returned unchanged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::options::RequestOptions;

/// Turns a failure into the error the caller receives.
pub type ErrorHandler = Arc<dyn Fn(ClientError) -> ApiError + Send + Sync>;

/// Decides whether a matcher applies to a failure.
pub type ErrorPredicate = Arc<dyn Fn(&ClientError) -> bool + Send + Sync>;

/// Handlers keyed by HTTP status code and by status text.
///
/// ## Examples
///
/// ```rust
/// use api_factory::{ApiError, ErrorDefaults};
///
/// let defaults = ErrorDefaults::new()
///     .on_status(404, ApiError::Client)
///     .on_status_text("Service Unavailable", ApiError::Client);
/// assert_eq!(defaults.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct ErrorDefaults {
    by_status: HashMap<u16, ErrorHandler>,
    by_status_text: HashMap<String, ErrorHandler>,
}

impl ErrorDefaults {
    /// Creates an empty set of defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a status code.
    pub fn on_status<F>(mut self, status: u16, handler: F) -> Self
    where
        F: Fn(ClientError) -> ApiError + Send + Sync + 'static,
    {
        self.by_status.insert(status, Arc::new(handler));
        self
    }

    /// Registers a handler for a status text.
    pub fn on_status_text<F>(mut self, status_text: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ClientError) -> ApiError + Send + Sync + 'static,
    {
        self.by_status_text.insert(status_text.into(), Arc::new(handler));
        self
    }

    /// Returns `self` with `overrides` laid on top; overrides win per key.
    pub fn merged(&self, overrides: Option<&ErrorDefaults>) -> ErrorDefaults {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            merged.by_status.extend(
                overrides
                    .by_status
                    .iter()
                    .map(|(status, handler)| (*status, handler.clone())),
            );
            merged.by_status_text.extend(
                overrides
                    .by_status_text
                    .iter()
                    .map(|(text, handler)| (text.clone(), handler.clone())),
            );
        }
        merged
    }

    /// Finds the handler registered for the error's status code.
    pub fn find_by_status(&self, error: &ClientError) -> Option<&ErrorHandler> {
        error
            .status_code()
            .and_then(|status| self.by_status.get(&status))
    }

    /// Finds the handler registered for the error's status text.
    pub fn find_by_status_text(&self, error: &ClientError) -> Option<&ErrorHandler> {
        error
            .status_text()
            .and_then(|text| self.by_status_text.get(text))
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.by_status.len() + self.by_status_text.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ErrorDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<_> = self.by_status.keys().collect();
        statuses.sort();
        let mut texts: Vec<_> = self.by_status_text.keys().collect();
        texts.sort();
        f.debug_struct("ErrorDefaults")
            .field("by_status", &statuses)
            .field("by_status_text", &texts)
            .finish()
    }
}

/// A named predicate/handler pair.
#[derive(Clone)]
pub struct ErrorMatcher {
    name: String,
    test: ErrorPredicate,
    handler: ErrorHandler,
}

impl ErrorMatcher {
    /// Creates a matcher.
    pub fn new<T, H>(name: impl Into<String>, test: T, handler: H) -> Self
    where
        T: Fn(&ClientError) -> bool + Send + Sync + 'static,
        H: Fn(ClientError) -> ApiError + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            test: Arc::new(test),
            handler: Arc::new(handler),
        }
    }

    /// Returns the matcher's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the matcher applies to `error`.
    pub fn matches(&self, error: &ClientError) -> bool {
        (self.test)(error)
    }

    /// Returns the matcher's handler.
    pub fn handler(&self) -> &ErrorHandler {
        &self.handler
    }
}

impl fmt::Debug for ErrorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMatcher")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered matchers. Order is the scan order.
#[derive(Debug, Clone, Default)]
pub struct ErrorMatchers(Vec<ErrorMatcher>);

impl ErrorMatchers {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a matcher, or replaces the one with the same name in place.
    pub fn with(mut self, matcher: ErrorMatcher) -> Self {
        self.push(matcher);
        self
    }

    /// Appends a matcher, or replaces the one with the same name in place.
    pub fn push(&mut self, matcher: ErrorMatcher) {
        match self.0.iter_mut().find(|m| m.name == matcher.name) {
            Some(existing) => *existing = matcher,
            None => self.0.push(matcher),
        }
    }

    /// Returns `self` with `overrides` merged in by name.
    ///
    /// An override with an existing name takes that matcher's position; new
    /// names are appended in their own order.
    pub fn merged(&self, overrides: Option<&ErrorMatchers>) -> ErrorMatchers {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            for matcher in &overrides.0 {
                merged.push(matcher.clone());
            }
        }
        merged
    }

    /// Returns the first matcher accepting `error`.
    pub fn find(&self, error: &ClientError) -> Option<&ErrorMatcher> {
        self.0.iter().find(|m| m.matches(error))
    }

    /// Returns matcher names in scan order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(ErrorMatcher::name).collect()
    }

    /// Iterates matchers in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorMatcher> {
        self.0.iter()
    }

    /// Returns the number of matchers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no matchers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ErrorMatcher> for ErrorMatchers {
    fn from_iter<I: IntoIterator<Item = ErrorMatcher>>(iter: I) -> Self {
        let mut matchers = Self::new();
        for matcher in iter {
            matchers.push(matcher);
        }
        matchers
    }
}

/// Which rule picked a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Status-code default.
    StatusCode(u16),
    /// Status-text default.
    StatusText(String),
    /// Named matcher.
    Matcher(String),
}

/// Resolves failures to handlers.
#[derive(Debug, Clone, Default)]
pub struct ErrorDispatcher {
    defaults: ErrorDefaults,
    matchers: ErrorMatchers,
}

impl ErrorDispatcher {
    /// Creates a dispatcher over already-merged defaults and matchers.
    pub fn new(defaults: ErrorDefaults, matchers: ErrorMatchers) -> Self {
        Self { defaults, matchers }
    }

    /// Creates the dispatcher for one request: client-level defaults and
    /// matchers with the request's overrides laid on top.
    pub fn for_request(config: &ClientConfig, options: &RequestOptions) -> Self {
        Self {
            defaults: config.error_defaults().merged(options.error_defaults.as_ref()),
            matchers: config.error_matchers().merged(options.error_matchers.as_ref()),
        }
    }

    /// Finds the handler for `error` and the rule that picked it.
    pub fn resolve(&self, error: &ClientError) -> Option<(Resolution, ErrorHandler)> {
        if let Some(handler) = self.defaults.find_by_status(error) {
            let status = error.status_code().unwrap_or_default();
            return Some((Resolution::StatusCode(status), handler.clone()));
        }
        if let Some(handler) = self.defaults.find_by_status_text(error) {
            let text = error.status_text().unwrap_or_default().to_string();
            return Some((Resolution::StatusText(text), handler.clone()));
        }
        self.matchers
            .find(error)
            .map(|m| (Resolution::Matcher(m.name().to_string()), m.handler().clone()))
    }

    /// Converts a failure into the caller-facing error.
    pub fn handle_failure(&self, error: ClientError) -> ApiError {
        match self.resolve(&error) {
            Some((resolution, handler)) => {
                debug!(?resolution, error = %error, "error handler resolved");
                handler(error)
            }
            None => {
                debug!(error = %error, "no error handler matched");
                ApiError::Client(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Clone, Copy, Error, PartialEq)]
    enum Handled {
        #[error("h1")]
        H1,
        #[error("h2")]
        H2,
        #[error("h3")]
        H3,
    }

    fn reject(kind: Handled) -> impl Fn(ClientError) -> ApiError + Send + Sync + 'static {
        move |_| ApiError::rejected(kind)
    }

    fn not_found() -> ClientError {
        ClientError::http_status(404, "")
    }

    fn network() -> ClientError {
        ClientError::Connection("refused".to_string())
    }

    #[test]
    fn test_status_default_beats_matcher() {
        let dispatcher = ErrorDispatcher::new(
            ErrorDefaults::new().on_status(404, reject(Handled::H1)),
            ErrorMatchers::new().with(ErrorMatcher::new("any", |_| true, reject(Handled::H2))),
        );

        let err = dispatcher.handle_failure(not_found());
        assert_eq!(err.rejection::<Handled>(), Some(&Handled::H1));
    }

    #[test]
    fn test_no_response_uses_matchers() {
        let dispatcher = ErrorDispatcher::new(
            ErrorDefaults::new().on_status(404, reject(Handled::H1)),
            ErrorMatchers::new().with(ErrorMatcher::new("any", |_| true, reject(Handled::H2))),
        );

        let err = dispatcher.handle_failure(network());
        assert_eq!(err.rejection::<Handled>(), Some(&Handled::H2));
    }

    #[test]
    fn test_status_text_after_status_code() {
        let dispatcher = ErrorDispatcher::new(
            ErrorDefaults::new()
                .on_status_text("Not Found", reject(Handled::H3))
                .on_status(500, reject(Handled::H1)),
            ErrorMatchers::new(),
        );

        let (resolution, _) = dispatcher.resolve(&not_found()).unwrap();
        assert_eq!(resolution, Resolution::StatusText("Not Found".to_string()));

        let (resolution, _) = dispatcher.resolve(&ClientError::http_status(500, "")).unwrap();
        assert_eq!(resolution, Resolution::StatusCode(500));
    }

    #[test]
    fn test_first_matching_matcher_wins() {
        let matchers = ErrorMatchers::new()
            .with(ErrorMatcher::new("never", |_| false, reject(Handled::H1)))
            .with(ErrorMatcher::new("server", |e| e.status_code() == Some(503), reject(Handled::H2)))
            .with(ErrorMatcher::new("any", |_| true, reject(Handled::H3)));
        let dispatcher = ErrorDispatcher::new(ErrorDefaults::new(), matchers);

        let (resolution, _) = dispatcher.resolve(&ClientError::http_status(503, "")).unwrap();
        assert_eq!(resolution, Resolution::Matcher("server".to_string()));

        let (resolution, _) = dispatcher.resolve(&network()).unwrap();
        assert_eq!(resolution, Resolution::Matcher("any".to_string()));
    }

    #[test]
    fn test_unhandled_returns_original() {
        let dispatcher = ErrorDispatcher::default();
        let err = dispatcher.handle_failure(not_found());
        assert!(matches!(
            err,
            ApiError::Client(ClientError::HttpStatus { status: 404, .. })
        ));
    }

    #[test]
    fn test_defaults_override_wins() {
        let base = ErrorDefaults::new()
            .on_status(404, reject(Handled::H1))
            .on_status(500, reject(Handled::H1));
        let overrides = ErrorDefaults::new().on_status(404, reject(Handled::H2));
        let dispatcher = ErrorDispatcher::new(base.merged(Some(&overrides)), ErrorMatchers::new());

        let err = dispatcher.handle_failure(not_found());
        assert_eq!(err.rejection::<Handled>(), Some(&Handled::H2));
        let err = dispatcher.handle_failure(ClientError::http_status(500, ""));
        assert_eq!(err.rejection::<Handled>(), Some(&Handled::H1));
    }

    #[test]
    fn test_matchers_merge_keeps_position() {
        let base = ErrorMatchers::new()
            .with(ErrorMatcher::new("a", |_| false, reject(Handled::H1)))
            .with(ErrorMatcher::new("b", |_| true, reject(Handled::H1)));
        let overrides = ErrorMatchers::new()
            .with(ErrorMatcher::new("c", |_| true, reject(Handled::H3)))
            .with(ErrorMatcher::new("b", |_| true, reject(Handled::H2)));

        let merged = base.merged(Some(&overrides));
        assert_eq!(merged.names(), vec!["a", "b", "c"]);

        let dispatcher = ErrorDispatcher::new(ErrorDefaults::new(), merged);
        let err = dispatcher.handle_failure(network());
        assert_eq!(err.rejection::<Handled>(), Some(&Handled::H2));
    }

    #[test]
    fn test_handler_receives_raw_error() {
        let dispatcher = ErrorDispatcher::new(
            ErrorDefaults::new().on_status(404, |e: ClientError| {
                ApiError::Client(ClientError::Connection(format!("was {}", e.status_code().unwrap())))
            }),
            ErrorMatchers::new(),
        );

        let err = dispatcher.handle_failure(not_found());
        assert_eq!(err.to_string(), "Connection failed: was 404");
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_resolution_is_logged() {
        let dispatcher = ErrorDispatcher::new(
            ErrorDefaults::new().on_status(404, reject(Handled::H1)),
            ErrorMatchers::new(),
        );
        let _ = dispatcher.handle_failure(not_found());
        assert!(logs_contain("error handler resolved"));
    }
}
