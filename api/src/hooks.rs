//! Pre-request hooks.
//!
//! A hook sees the assembled [`RequestOptions`] just before the transport
//! sends them and returns the options to send. Hooks run either inline or as
//! a future the client awaits first.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::ClientError;
use crate::formatter;
use crate::options::RequestOptions;
use crate::transport::{BoxFuture, Transport};

/// What a hook produces.
pub type HookResult = Result<RequestOptions, ClientError>;

type SyncHook = dyn Fn(RequestOptions, &HookContext) -> HookResult + Send + Sync;
type AsyncHook = dyn Fn(RequestOptions, HookContext) -> BoxFuture<'static, HookResult> + Send + Sync;

/// Built-in hook helpers handed to every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plugins;

impl Plugins {
    /// See [`formatter::content_formatter`].
    pub fn content_formatter(&self, options: RequestOptions) -> RequestOptions {
        formatter::content_formatter(options)
    }
}

/// Context passed to hooks alongside the options.
#[derive(Debug, Clone)]
pub struct HookContext {
    transport: Arc<dyn Transport>,
    plugins: Plugins,
}

impl HookContext {
    /// Creates a context for a request sent through `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            plugins: Plugins,
        }
    }

    /// The transport the request will be sent with. Hooks may use it for
    /// side requests such as fetching a token.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Built-in hook helpers.
    pub fn plugins(&self) -> &Plugins {
        &self.plugins
    }
}

/// A pre-request hook.
///
/// ## Examples
///
/// ```rust
/// use api_factory::BeforeRequest;
///
/// let stamp = BeforeRequest::sync(|mut options, _ctx| {
///     options.set_header("X-Client", "api-factory");
///     Ok(options)
/// });
///
/// let delayed = BeforeRequest::future(|options, _ctx| async move {
///     // e.g. await a token refresh here
///     Ok(options)
/// });
/// # let _ = (stamp, delayed);
/// ```
#[derive(Clone)]
pub enum BeforeRequest {
    /// Runs inline.
    Sync(Arc<SyncHook>),
    /// Returns a future that is awaited before sending.
    Async(Arc<AsyncHook>),
}

impl BeforeRequest {
    /// A hook that returns the options untouched.
    pub fn identity() -> Self {
        Self::sync(|options, _| Ok(options))
    }

    /// A hook running [`Plugins::content_formatter`].
    pub fn content_formatter() -> Self {
        Self::sync(|options, ctx| Ok(ctx.plugins().content_formatter(options)))
    }

    /// Wraps a synchronous hook.
    pub fn sync<F>(hook: F) -> Self
    where
        F: Fn(RequestOptions, &HookContext) -> HookResult + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(hook))
    }

    /// Wraps an asynchronous hook.
    pub fn future<F, Fut>(hook: F) -> Self
    where
        F: Fn(RequestOptions, HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        let hook: Arc<AsyncHook> = Arc::new(
            move |options: RequestOptions, ctx: HookContext| -> BoxFuture<'static, HookResult> {
                Box::pin(hook(options, ctx))
            },
        );
        Self::Async(hook)
    }

    /// Runs the hook.
    pub async fn run(&self, options: RequestOptions, ctx: HookContext) -> HookResult {
        match self {
            Self::Sync(hook) => hook(options, &ctx),
            Self::Async(hook) => hook(options, ctx).await,
        }
    }
}

impl Default for BeforeRequest {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for BeforeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("BeforeRequest::Sync"),
            Self::Async(_) => f.write_str("BeforeRequest::Async"),
        }
    }
}
