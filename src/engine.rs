//! Resolution engine and runtime handler surface.
//!
//! The [`EngineBuilder`] collects the initial handlers and configuration.
//! The [`Engine`] is a cheap, cloneable handle that:
//! 1. Resolves requests against a snapshot of the active handlers
//! 2. Prepends runtime handlers (`use_handlers`)
//! 3. Resets, restores and lists handlers
//!
//! # Example
//!
//! ```
//! use mockwire::{Engine, Handler, MockRequest, MockResponse, Route};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mockwire::MockError> {
//!     let engine = Engine::builder()
//!         .handler(Handler::respond(Route::get("/book/:id")?, MockResponse::status(200)))
//!         .build()?;
//!
//!     engine.use_handlers(vec![Handler::respond_once(
//!         Route::get("/book/:id")?,
//!         MockResponse::status(500),
//!     )]);
//!
//!     let first = engine.resolve(MockRequest::get("/book/42")).await;
//!     assert_eq!(first.response().map(|r| r.status_code()), Some(500));
//!
//!     let second = engine.resolve(MockRequest::get("/book/42")).await;
//!     assert_eq!(second.response().map(|r| r.status_code()), Some(200));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::{EngineConfig, UnhandledPolicy};
use crate::dispatch::Decision;
use crate::error::Result;
use crate::events::{EventBus, LifecycleEvent, RequestId};
use crate::handler::{Claim, Handler, HandlerInfo, HandlerList, RequestContext};
use crate::request::MockRequest;
use crate::response::{MockResponse, Resolution};

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A handler answered.
    Handled {
        handler: HandlerInfo,
        response: MockResponse,
    },
    /// No handler answered; the request should proceed without mocking.
    Unhandled,
}

impl Outcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled { .. })
    }

    pub fn response(&self) -> Option<&MockResponse> {
        match self {
            Outcome::Handled { response, .. } => Some(response),
            Outcome::Unhandled => None,
        }
    }

    pub fn into_response(self) -> Option<MockResponse> {
        match self {
            Outcome::Handled { response, .. } => Some(response),
            Outcome::Unhandled => None,
        }
    }
}

/// Builder for configuring and creating an [`Engine`].
pub struct EngineBuilder {
    handlers: Vec<Handler>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new engine builder.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Append an initial handler.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Append several initial handlers, in order.
    pub fn handlers(mut self, handlers: impl IntoIterator<Item = Handler>) -> Self {
        self.handlers.extend(handlers);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the unhandled-request policy.
    ///
    /// Default: `Warn`
    pub fn on_unhandled(mut self, policy: UnhandledPolicy) -> Self {
        self.config.on_unhandled = policy;
        self
    }

    /// Set the maximum number of concurrent resolutions in the dispatcher.
    ///
    /// Default: 256
    pub fn max_concurrent_resolutions(mut self, limit: usize) -> Self {
        self.config.max_concurrent_resolutions = limit;
        self
    }

    /// Set the lifecycle event buffer size.
    ///
    /// Default: 128
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Validate the configuration and build the engine.
    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        Ok(Engine::from_parts(self.handlers, self.config))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct EngineInner {
    handlers: HandlerList,
    config: EngineConfig,
    events: EventBus,
}

/// Handle to a resolution engine. Clones share the same handler list.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Create a new engine builder.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with the given initial handlers and default configuration.
    pub fn new(handlers: impl IntoIterator<Item = Handler>) -> Self {
        Self::from_parts(handlers.into_iter().collect(), EngineConfig::default())
    }

    fn from_parts(handlers: Vec<Handler>, config: EngineConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(EngineInner {
                handlers: HandlerList::new(handlers),
                config,
                events,
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Prepend runtime handlers. They take priority over every handler already
    /// present, and are visible to every resolution that starts afterwards.
    pub fn use_handlers(&self, handlers: impl IntoIterator<Item = Handler>) {
        self.inner.handlers.prepend(handlers);
        tracing::debug!(
            runtime = self.inner.handlers.runtime_len(),
            "Runtime handlers prepended"
        );
    }

    /// Drop runtime handlers and re-arm initial one-time handlers.
    pub fn reset_handlers(&self) {
        self.inner.handlers.reset();
        tracing::debug!("Handlers reset to initial configuration");
    }

    /// Drop runtime handlers and install a new initial baseline.
    pub fn reset_handlers_with(&self, handlers: impl IntoIterator<Item = Handler>) {
        self.inner.handlers.replace_initial(handlers);
        tracing::debug!(
            initial = self.inner.handlers.len(),
            "Handlers reset to new baseline"
        );
    }

    /// Re-arm consumed one-time handlers without dropping runtime handlers.
    pub fn restore_handlers(&self) -> usize {
        let restored = self.inner.handlers.restore();
        tracing::debug!(restored, "One-time handlers restored");
        restored
    }

    /// Every handler in scan order, consumed ones included.
    pub fn list_handlers(&self) -> Vec<HandlerInfo> {
        self.inner.handlers.list()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.events.subscribe()
    }

    /// Resolve a request against the handlers active right now.
    ///
    /// Never fails: predicate errors count as "no match", resolver errors make
    /// the request unhandled. Both are logged and published as
    /// [`LifecycleEvent::HandlerError`].
    pub async fn resolve(&self, request: MockRequest) -> Outcome {
        let events = &self.inner.events;
        let request_id = events.next_request_id();

        events.emit_with(|| LifecycleEvent::RequestStart {
            request_id,
            request: request.clone(),
        });

        let outcome = self.scan(request_id, &request).await;

        match &outcome {
            Outcome::Handled { handler, response } => {
                events.emit(LifecycleEvent::RequestMatch {
                    request_id,
                    handler: handler.clone(),
                    status: response.status_code(),
                });
            }
            Outcome::Unhandled => {
                events.emit_with(|| LifecycleEvent::RequestUnhandled {
                    request_id,
                    request: request.clone(),
                });
            }
        }

        events.emit(LifecycleEvent::RequestEnd { request_id });
        outcome
    }

    /// Resolve a request and apply the unhandled policy.
    pub async fn handle(&self, request: MockRequest) -> Decision {
        let summary = request.to_string();

        match self.resolve(request).await {
            Outcome::Handled { response, .. } => Decision::Respond(response),
            Outcome::Unhandled => match self.inner.config.on_unhandled {
                UnhandledPolicy::Bypass => Decision::Bypass,
                UnhandledPolicy::Warn => {
                    tracing::warn!("Unhandled request {}, forwarding as-is", summary);
                    Decision::Bypass
                }
                UnhandledPolicy::Error => {
                    tracing::error!("Unhandled request {}, rejecting", summary);
                    Decision::Reject(format!("No handler for {}", summary))
                }
            },
        }
    }

    async fn scan(&self, request_id: RequestId, request: &MockRequest) -> Outcome {
        // Snapshot: handlers prepended from here on do not affect this request.
        let snapshot = self.inner.handlers.active_handlers();

        for handler in snapshot {
            match handler.matches(request) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(%request_id, "{}", e);
                    self.report_error(request_id, &handler, e.to_string());
                    continue;
                }
            }

            // Waits while another request runs this one-time handler; skips it
            // only if that request consumed it.
            let Some(claim) = Claim::acquire(&handler).await else {
                tracing::debug!(%request_id, handler = %handler.header(), "Skipping consumed one-time handler");
                continue;
            };

            let ctx = RequestContext::new(
                request_id,
                request.clone(),
                handler.params(request),
                handler.info(),
            );

            match handler.resolve(ctx).await {
                Ok(Resolution::Respond(response)) => {
                    // Recorded while the claim is still held
                    self.inner.handlers.mark_consumed(claim.handler());
                    drop(claim);
                    tracing::debug!(
                        %request_id,
                        handler = %handler.header(),
                        status = response.status_code(),
                        "Request handled"
                    );
                    return Outcome::Handled {
                        handler: handler.info(),
                        response,
                    };
                }
                Ok(Resolution::Pass) => {
                    tracing::debug!(%request_id, handler = %handler.header(), "Handler passed");
                }
                Err(e) => {
                    tracing::error!(%request_id, "{}", e);
                    self.report_error(request_id, &handler, e.to_string());
                    return Outcome::Unhandled;
                }
            }
        }

        Outcome::Unhandled
    }

    fn report_error(&self, request_id: RequestId, handler: &Handler, error: String) {
        self.inner.events.emit(LifecycleEvent::HandlerError {
            request_id,
            handler: handler.info(),
            error,
        });
    }
}
