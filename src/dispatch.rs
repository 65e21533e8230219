//! Dispatcher between the transport collaborator and the engine.
//!
//! The transport pushes [`InterceptedRequest`]s into an mpsc channel; the
//! [`Dispatcher`] resolves each one on its own task and answers through the
//! request's oneshot reply.
//!
//! ```text
//! Transport ─► mpsc::Sender<InterceptedRequest> ─► Dispatcher ─► task per request
//!     ▲                                                            │
//!     └──────────────── oneshot::Sender<Decision> ◄────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mockwire::{Decision, Dispatcher, Engine, Handler, MockRequest, MockResponse, Route};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mockwire::MockError> {
//!     let engine = Engine::new(vec![Handler::respond(
//!         Route::get("/ping")?,
//!         MockResponse::text("pong"),
//!     )]);
//!     let (interceptor, dispatcher) = Dispatcher::channel(engine, 64);
//!
//!     let decision = interceptor.intercept(MockRequest::get("/ping")).await?;
//!     assert!(matches!(decision, Decision::Respond(_)));
//!
//!     drop(interceptor);
//!     dispatcher.wait_for_shutdown().await
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;

use crate::engine::Engine;
use crate::error::{MockError, Result};
use crate::request::MockRequest;
use crate::response::MockResponse;

/// What the transport should do with an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer with this mock response.
    Respond(MockResponse),
    /// Let the request reach the real network.
    Bypass,
    /// Fail the request with this reason.
    Reject(String),
}

/// A request captured by the transport, paired with its reply slot.
#[derive(Debug)]
pub struct InterceptedRequest {
    pub request: MockRequest,
    pub reply: oneshot::Sender<Decision>,
}

impl InterceptedRequest {
    /// Pair a request with a fresh reply channel.
    pub fn new(request: MockRequest) -> (Self, oneshot::Receiver<Decision>) {
        let (reply, rx) = oneshot::channel();
        (Self { request, reply }, rx)
    }
}

/// Cloneable sending side used by the transport.
#[derive(Debug, Clone)]
pub struct Interceptor {
    tx: mpsc::Sender<InterceptedRequest>,
}

impl Interceptor {
    /// Submit a request and wait for the decision.
    ///
    /// Returns [`MockError::EngineClosed`] if the dispatcher is gone.
    pub async fn intercept(&self, request: MockRequest) -> Result<Decision> {
        let (intercepted, rx) = InterceptedRequest::new(request);
        self.tx
            .send(intercepted)
            .await
            .map_err(|_| MockError::EngineClosed)?;
        rx.await.map_err(|_| MockError::EngineClosed)
    }
}

/// Runs the dispatch loop for one engine.
pub struct Dispatcher {
    task: JoinHandle<()>,
}

impl Dispatcher {
    /// Create a channel of the given capacity and start dispatching from it.
    pub fn channel(engine: Engine, capacity: usize) -> (Interceptor, Dispatcher) {
        let (tx, rx) = mpsc::channel(capacity);
        (Interceptor { tx }, Self::spawn(engine, rx))
    }

    /// Start dispatching requests from an existing receiver.
    ///
    /// The loop ends when every sender is dropped and in-flight resolutions
    /// have finished.
    pub fn spawn(engine: Engine, rx: mpsc::Receiver<InterceptedRequest>) -> Dispatcher {
        let limit = engine.config().max_concurrent_resolutions;
        let semaphore = Arc::new(Semaphore::new(limit));

        let task = tokio::spawn(async move {
            Self::dispatch_loop(engine, rx, semaphore.clone()).await;

            // Drain: every permit back means every resolution task is done
            let permits = u32::try_from(limit).unwrap_or(u32::MAX);
            if semaphore.acquire_many(permits).await.is_err() {
                tracing::warn!("Dispatcher semaphore closed while draining");
            }
            tracing::debug!("Dispatcher stopped");
        });

        Dispatcher { task }
    }

    async fn dispatch_loop(
        engine: Engine,
        mut rx: mpsc::Receiver<InterceptedRequest>,
        semaphore: Arc<Semaphore>,
    ) {
        while let Some(intercepted) = rx.recv().await {
            // Wait for capacity rather than dropping the request
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!("Dispatcher semaphore closed, stopping");
                    return;
                }
            };

            let engine = engine.clone();
            tokio::spawn(async move {
                // Permit is held until this task completes
                let _permit = permit;
                Self::dispatch_one(engine, intercepted).await;
            });
        }
    }

    async fn dispatch_one(engine: Engine, intercepted: InterceptedRequest) {
        let InterceptedRequest { request, mut reply } = intercepted;
        let summary = request.to_string();

        // Transport abort cancels the resolution; a one-time claim is
        // released unconsumed when the future is dropped.
        let decision = tokio::select! {
            decision = engine.handle(request) => Some(decision),
            _ = reply.closed() => None,
        };

        match decision {
            Some(decision) => {
                if reply.send(decision).is_err() {
                    tracing::debug!("Transport dropped {} before the decision arrived", summary);
                }
            }
            None => tracing::debug!("Request {} aborted by transport", summary),
        }
    }

    /// Wait until the dispatcher stops (all senders dropped, work drained).
    pub async fn wait_for_shutdown(self) -> Result<()> {
        self.task.await.map_err(|e| {
            tracing::error!("Dispatcher task failed: {}", e);
            MockError::EngineClosed
        })
    }

    /// Stop immediately, abandoning queued requests.
    pub fn abort(&self) {
        self.task.abort();
    }
}
