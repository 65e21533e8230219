//! Lifecycle events emitted while resolving requests.
//!
//! Every resolution gets a [`RequestId`] and produces, in order:
//! `RequestStart`, then `RequestMatch` or `RequestUnhandled`, then `RequestEnd`.
//! `HandlerError` is emitted in between whenever a predicate or resolver fails.
//!
//! Events travel over a `tokio::sync::broadcast` channel. Slow subscribers
//! lose the oldest events (`RecvError::Lagged`); nobody listening is fine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::handler::HandlerInfo;
use crate::request::MockRequest;

/// Identifier of one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A step in a request's resolution.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// Resolution began.
    RequestStart {
        request_id: RequestId,
        request: MockRequest,
    },
    /// A handler answered the request.
    RequestMatch {
        request_id: RequestId,
        handler: HandlerInfo,
        status: u16,
    },
    /// No handler answered the request.
    RequestUnhandled {
        request_id: RequestId,
        request: MockRequest,
    },
    /// Resolution finished.
    RequestEnd { request_id: RequestId },
    /// A predicate or resolver failed.
    HandlerError {
        request_id: RequestId,
        handler: HandlerInfo,
        error: String,
    },
}

impl LifecycleEvent {
    pub fn request_id(&self) -> RequestId {
        match self {
            LifecycleEvent::RequestStart { request_id, .. }
            | LifecycleEvent::RequestMatch { request_id, .. }
            | LifecycleEvent::RequestUnhandled { request_id, .. }
            | LifecycleEvent::RequestEnd { request_id }
            | LifecycleEvent::HandlerError { request_id, .. } => *request_id,
        }
    }
}

/// Broadcasts lifecycle events and hands out request IDs.
pub(crate) struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
    next_request_id: AtomicU64,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_request_id(&self) -> RequestId {
        RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: LifecycleEvent) {
        // Err only means there are no subscribers
        let _ = self.tx.send(event);
    }

    /// Emit an event that is costly to build, only if someone is listening.
    pub(crate) fn emit_with(&self, build: impl FnOnce() -> LifecycleEvent) {
        if self.tx.receiver_count() > 0 {
            self.emit(build());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_sequential() {
        let bus = EventBus::new(8);

        assert_eq!(bus.next_request_id(), RequestId::new(1));
        assert_eq!(bus.next_request_id(), RequestId::new(2));
        assert_eq!(RequestId::new(3).to_string(), "req-3");
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(8);
        bus.emit(LifecycleEvent::RequestEnd {
            request_id: RequestId::new(1),
        });
    }

    #[test]
    fn test_emit_with_skips_build_without_subscribers() {
        let bus = EventBus::new(8);
        let mut built = false;
        bus.emit_with(|| {
            built = true;
            LifecycleEvent::RequestEnd {
                request_id: RequestId::new(1),
            }
        });
        assert!(!built);

        let mut rx = bus.subscribe();
        bus.emit_with(|| LifecycleEvent::RequestEnd {
            request_id: RequestId::new(2),
        });
        assert_eq!(rx.try_recv().unwrap().request_id(), RequestId::new(2));
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(LifecycleEvent::RequestStart {
            request_id: RequestId::new(5),
            request: MockRequest::get("/x"),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.request_id(), RequestId::new(5));
        assert!(matches!(event, LifecycleEvent::RequestStart { .. }));
    }
}
