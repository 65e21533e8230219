//! Handler definition: predicate + resolver + lifecycle.
//!
//! A [`Handler`] is a single concrete record. Predicates and resolvers are trait
//! objects so closures, [`Route`](crate::Route)s and custom matchers all fit the
//! same shape.
//!
//! # One-time state
//!
//! `OneTime` handlers carry a consumed flag and a gate:
//!
//! ```text
//! Armed ──claim (gate held)──► respond ──► Consumed
//!   ▲             │
//!   └─pass/err/drop (gate released, still Armed)
//! ```
//!
//! The engine claims a one-time handler before running its resolver. A
//! concurrent resolution that reaches the same handler waits for the gate,
//! then re-checks: it skips the handler only if the claimant consumed it.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::RequestContext;
use crate::error::{MockError, Result};
use crate::request::MockRequest;
use crate::response::{MockResponse, Resolution};
use crate::route::PathParams;

/// Result type for resolver functions.
pub type ResolverResult = Result<Resolution>;

/// Boxed future for resolver results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a handler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How many times a handler may answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Answers every matching request.
    Permanent,
    /// Answers the first matching request, then becomes inert.
    OneTime,
}

/// Decides whether a handler applies to a request.
///
/// Must be side-effect free and deterministic for a given request. Closures
/// `Fn(&MockRequest) -> bool` implement this trait directly; wrap fallible
/// closures in [`TryPredicate`].
pub trait Predicate: Send + Sync + 'static {
    /// Test the request.
    fn matches(&self, request: &MockRequest) -> Result<bool>;

    /// Parameters captured from a matching request.
    fn params(&self, _request: &MockRequest) -> PathParams {
        PathParams::new()
    }

    /// Short description used as the handler header.
    fn describe(&self) -> String {
        "<predicate>".to_string()
    }
}

impl<F> Predicate for F
where
    F: Fn(&MockRequest) -> bool + Send + Sync + 'static,
{
    fn matches(&self, request: &MockRequest) -> Result<bool> {
        Ok(self(request))
    }
}

/// Predicate built from a closure that can fail.
pub struct TryPredicate<F>(pub F);

impl<F> Predicate for TryPredicate<F>
where
    F: Fn(&MockRequest) -> Result<bool> + Send + Sync + 'static,
{
    fn matches(&self, request: &MockRequest) -> Result<bool> {
        (self.0)(request)
    }
}

/// Produces the outcome for a request whose predicate matched.
pub trait Resolver: Send + Sync + 'static {
    /// Resolve the request described by `ctx`.
    fn resolve(&self, ctx: RequestContext) -> BoxFuture<'static, ResolverResult>;
}

/// Wrapper turning an async closure into a [`Resolver`].
pub struct FnResolver<F, Fut>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult> + Send + 'static,
{
    resolver: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnResolver<F, Fut>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult> + Send + 'static,
{
    /// Create a new closure resolver.
    pub fn new(resolver: F) -> Self {
        Self {
            resolver,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Resolver for FnResolver<F, Fut>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolverResult> + Send + 'static,
{
    fn resolve(&self, ctx: RequestContext) -> BoxFuture<'static, ResolverResult> {
        Box::pin((self.resolver)(ctx))
    }
}

/// Snapshot of a handler for listings, events and resolver contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerInfo {
    pub id: HandlerId,
    pub header: String,
    pub lifecycle: Lifecycle,
    pub consumed: bool,
}

/// A mock request handler.
///
/// # Example
///
/// ```
/// use mockwire::{Handler, MockResponse, Route};
///
/// let handler = Handler::new(Route::get("/book/:id").unwrap(), |ctx| async move {
///     let id = ctx.param("id").unwrap_or_default().to_string();
///     ctx.json(&serde_json::json!({ "id": id }))
/// });
///
/// let fail_once = Handler::respond_once(Route::get("/book/:id").unwrap(), MockResponse::status(500));
/// assert!(!fail_once.is_consumed());
/// # let _ = handler;
/// ```
pub struct Handler {
    id: HandlerId,
    header: String,
    predicate: Box<dyn Predicate>,
    resolver: Box<dyn Resolver>,
    lifecycle: Lifecycle,
    consumed: AtomicBool,
    /// Held by the resolution currently running a one-time resolver.
    gate: Arc<Mutex<()>>,
}

impl Handler {
    /// Create a permanent handler from a predicate and an async resolver.
    pub fn new<P, F, Fut>(predicate: P, resolver: F) -> Self
    where
        P: Predicate,
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self::from_parts(Box::new(predicate), Box::new(FnResolver::new(resolver)))
    }

    /// Create a permanent handler from boxed trait objects.
    pub fn from_parts(predicate: Box<dyn Predicate>, resolver: Box<dyn Resolver>) -> Self {
        Self {
            id: HandlerId::next(),
            header: predicate.describe(),
            predicate,
            resolver,
            lifecycle: Lifecycle::Permanent,
            consumed: AtomicBool::new(false),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Permanent handler answering every match with a fixed response.
    pub fn respond<P: Predicate>(predicate: P, response: MockResponse) -> Self {
        Self::new(predicate, move |_ctx| {
            let response = response.clone();
            async move { Ok(Resolution::Respond(response)) }
        })
    }

    /// One-time handler answering its first match with a fixed response.
    pub fn respond_once<P: Predicate>(predicate: P, response: MockResponse) -> Self {
        Self::respond(predicate, response).once()
    }

    /// Make this handler single-use.
    pub fn once(mut self) -> Self {
        self.lifecycle = Lifecycle::OneTime;
        self
    }

    /// Override the header shown in diagnostics.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    #[inline]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether a one-time handler has already answered. Always false for
    /// permanent handlers.
    pub fn is_consumed(&self) -> bool {
        self.lifecycle == Lifecycle::OneTime && self.consumed.load(Ordering::Acquire)
    }

    pub fn info(&self) -> HandlerInfo {
        HandlerInfo {
            id: self.id,
            header: self.header.clone(),
            lifecycle: self.lifecycle,
            consumed: self.is_consumed(),
        }
    }

    /// Test the request. A panicking predicate is reported as an error.
    pub(crate) fn matches(&self, request: &MockRequest) -> Result<bool> {
        std::panic::catch_unwind(AssertUnwindSafe(|| self.predicate.matches(request)))
            .unwrap_or_else(|payload| Err(MockError::predicate(panic_message(payload))))
            .map_err(|e| e.with_handler(&self.header))
    }

    pub(crate) fn params(&self, request: &MockRequest) -> PathParams {
        self.predicate.params(request)
    }

    /// Run the resolver. A panicking resolver is reported as an error.
    pub(crate) async fn resolve(&self, ctx: RequestContext) -> ResolverResult {
        // Building the future runs user code too.
        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| self.resolver.resolve(ctx))) {
            Ok(future) => AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(MockError::resolver(panic_message(payload)))),
            Err(payload) => Err(MockError::resolver(panic_message(payload))),
        };
        result.map_err(|e| e.with_handler(&self.header))
    }

    /// Returns true if this call transitioned the handler to consumed.
    pub(crate) fn consume(&self) -> bool {
        if self.lifecycle == Lifecycle::Permanent {
            return false;
        }
        !self.consumed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn rearm(&self) {
        self.consumed.store(false, Ordering::Release);
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("lifecycle", &self.lifecycle)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Exclusive right to answer with a handler for the duration of one resolver run.
///
/// For one-time handlers the claim holds the handler's gate. The caller must
/// record consumption before dropping the claim; dropping it without doing so
/// (pass, error, cancellation) leaves the handler armed for the next waiter.
pub(crate) struct Claim {
    handler: Arc<Handler>,
    _gate: Option<OwnedMutexGuard<()>>,
}

impl Claim {
    /// Claim the handler, waiting while another resolution holds it.
    ///
    /// Returns `None` if the handler was consumed by the time the gate opened.
    pub(crate) async fn acquire(handler: &Arc<Handler>) -> Option<Self> {
        let gate = match handler.lifecycle {
            Lifecycle::Permanent => None,
            Lifecycle::OneTime => {
                let guard = handler.gate.clone().lock_owned().await;
                if handler.is_consumed() {
                    return None;
                }
                Some(guard)
            }
        };

        Some(Self {
            handler: handler.clone(),
            _gate: gate,
        })
    }

    /// Whether another resolution currently holds this handler.
    #[cfg(test)]
    pub(crate) fn is_held(handler: &Handler) -> bool {
        handler.gate.try_lock().is_err()
    }

    #[inline]
    pub(crate) fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }
}
