//! Ordered handler list with runtime overrides.
//!
//! Scan order is: runtime handlers (most recently prepended batch first, each
//! batch in its own order), then initial handlers in declaration order.
//!
//! All structural changes and snapshot reads go through one lock, so a
//! resolution sees a batch prepend either completely or not at all. One-time
//! consumption state lives on the handlers themselves (see
//! [`Handler`](super::Handler)).
//!
//! # Example
//!
//! ```
//! use mockwire::handler::HandlerList;
//! use mockwire::{Handler, MockRequest, MockResponse};
//!
//! let list = HandlerList::new(vec![
//!     Handler::respond(|_: &MockRequest| true, MockResponse::status(200)),
//! ]);
//! list.prepend(vec![Handler::respond(|_: &MockRequest| true, MockResponse::status(503))]);
//!
//! assert_eq!(list.active_handlers().len(), 2);
//! list.reset();
//! assert_eq!(list.active_handlers().len(), 1);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use super::{Handler, HandlerInfo, Lifecycle};

#[derive(Default)]
struct ListState {
    /// Handlers supplied at setup, in declaration order.
    initial: Vec<Arc<Handler>>,
    /// Handlers added at runtime, in scan order.
    runtime: Vec<Arc<Handler>>,
}

impl ListState {
    fn iter(&self) -> impl Iterator<Item = &Arc<Handler>> {
        self.runtime.iter().chain(self.initial.iter())
    }

    fn contains(&self, handler: &Handler) -> bool {
        self.iter().any(|h| h.id() == handler.id())
    }
}

/// Shared, ordered collection of handlers.
#[derive(Default)]
pub struct HandlerList {
    state: RwLock<ListState>,
}

impl HandlerList {
    /// Create a list from the initial handlers.
    pub fn new(initial: impl IntoIterator<Item = Handler>) -> Self {
        Self {
            state: RwLock::new(ListState {
                initial: initial.into_iter().map(Arc::new).collect(),
                runtime: Vec::new(),
            }),
        }
    }

    /// Insert handlers ahead of everything currently present, keeping their
    /// relative order.
    pub fn prepend(&self, handlers: impl IntoIterator<Item = Handler>) {
        let batch: Vec<Arc<Handler>> = handlers.into_iter().map(Arc::new).collect();
        if batch.is_empty() {
            return;
        }

        let mut state = self.state.write();
        state.runtime.splice(0..0, batch);
    }

    /// Drop runtime handlers and re-arm initial one-time handlers.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.runtime.clear();
        for handler in &state.initial {
            handler.rearm();
        }
    }

    /// Replace the initial handlers with a new baseline and drop runtime handlers.
    pub fn replace_initial(&self, handlers: impl IntoIterator<Item = Handler>) {
        let initial: Vec<Arc<Handler>> = handlers.into_iter().map(Arc::new).collect();

        let mut state = self.state.write();
        state.runtime.clear();
        state.initial = initial;
    }

    /// Re-arm every consumed one-time handler, keeping runtime handlers.
    ///
    /// Returns the number of handlers re-armed.
    pub fn restore(&self) -> usize {
        let state = self.state.write();
        let mut restored = 0;
        for handler in state.iter().filter(|h| h.is_consumed()) {
            handler.rearm();
            restored += 1;
        }
        restored
    }

    /// Ordered snapshot of the handlers currently eligible for selection.
    ///
    /// Later changes to the list never affect a snapshot already taken.
    pub fn active_handlers(&self) -> Vec<Arc<Handler>> {
        let state = self.state.read();
        state.iter().filter(|h| !h.is_consumed()).cloned().collect()
    }

    /// Record that a one-time handler answered.
    ///
    /// No-op for permanent handlers and for handlers no longer in the list.
    /// Returns true if this call consumed the handler.
    pub fn mark_consumed(&self, handler: &Handler) -> bool {
        if handler.lifecycle() != Lifecycle::OneTime {
            return false;
        }

        // Write lock: consumption is serialized with snapshot reads.
        let state = self.state.write();
        if !state.contains(handler) {
            return false;
        }
        handler.consume()
    }

    /// Descriptors of every handler in scan order, consumed ones included.
    pub fn list(&self) -> Vec<HandlerInfo> {
        let state = self.state.read();
        state.iter().map(|h| h.info()).collect()
    }

    /// Number of handlers, consumed ones included.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.runtime.len() + state.initial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of runtime handlers.
    pub fn runtime_len(&self) -> usize {
        self.state.read().runtime.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockRequest, MockResponse};

    fn named(name: &str) -> Handler {
        Handler::respond(|_: &MockRequest| true, MockResponse::status(200)).with_header(name)
    }

    fn headers(handlers: &[Arc<Handler>]) -> Vec<String> {
        handlers.iter().map(|h| h.header().to_string()).collect()
    }

    #[test]
    fn test_initial_order_preserved() {
        let list = HandlerList::new(vec![named("a"), named("b"), named("c")]);

        assert_eq!(headers(&list.active_handlers()), vec!["a", "b", "c"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.runtime_len(), 0);
    }

    #[test]
    fn test_prepend_batches() {
        let list = HandlerList::new(vec![named("initial")]);

        list.prepend(vec![named("h1"), named("h2")]);
        list.prepend(vec![named("h3")]);

        assert_eq!(
            headers(&list.active_handlers()),
            vec!["h3", "h1", "h2", "initial"]
        );
        assert_eq!(list.runtime_len(), 3);
    }

    #[test]
    fn test_prepend_empty_batch_is_noop() {
        let list = HandlerList::new(vec![named("a")]);
        list.prepend(Vec::new());

        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_prepend() {
        let list = HandlerList::new(vec![named("a")]);

        let snapshot = list.active_handlers();
        list.prepend(vec![named("late")]);

        assert_eq!(headers(&snapshot), vec!["a"]);
        assert_eq!(headers(&list.active_handlers()), vec!["late", "a"]);
    }

    #[test]
    fn test_consumed_handlers_leave_snapshot_but_stay_listed() {
        let list = HandlerList::new(vec![named("once").once(), named("always")]);
        let once = list.active_handlers()[0].clone();

        assert!(list.mark_consumed(&once));

        assert_eq!(headers(&list.active_handlers()), vec!["always"]);
        let listed = list.list();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].consumed);
        assert!(!listed[1].consumed);
    }

    #[test]
    fn test_mark_consumed_noops() {
        let list = HandlerList::new(vec![named("permanent")]);
        let permanent = list.active_handlers()[0].clone();
        assert!(!list.mark_consumed(&permanent));
        assert!(!permanent.is_consumed());

        // Not part of the list
        let stranger = named("stranger").once();
        assert!(!list.mark_consumed(&stranger));
        assert!(!stranger.is_consumed());
    }

    #[test]
    fn test_mark_consumed_is_idempotent() {
        let list = HandlerList::new(vec![named("once").once()]);
        let once = list.active_handlers()[0].clone();

        assert!(list.mark_consumed(&once));
        assert!(!list.mark_consumed(&once));
        assert!(once.is_consumed());
    }

    #[test]
    fn test_reset_restores_initial_configuration() {
        let list = HandlerList::new(vec![named("a").once(), named("b")]);
        let a = list.active_handlers()[0].clone();
        list.mark_consumed(&a);
        list.prepend(vec![named("r1")]);
        list.prepend(vec![named("r2").once()]);

        list.reset();

        let active = list.active_handlers();
        assert_eq!(headers(&active), vec!["a", "b"]);
        assert!(active.iter().all(|h| !h.is_consumed()));
        assert_eq!(active[0].id(), a.id());
    }

    #[test]
    fn test_replace_initial_arms_new_baseline() {
        let list = HandlerList::new(vec![named("old")]);
        list.prepend(vec![named("runtime")]);

        list.replace_initial(vec![named("new").once()]);

        let active = list.active_handlers();
        assert_eq!(headers(&active), vec!["new"]);
        assert!(!active[0].is_consumed());

        // The new baseline is what reset returns to
        list.prepend(vec![named("later")]);
        list.reset();
        assert_eq!(headers(&list.active_handlers()), vec!["new"]);
    }

    #[test]
    fn test_restore_keeps_runtime_handlers() {
        let list = HandlerList::new(vec![named("initial").once()]);
        list.prepend(vec![named("runtime").once()]);
        for handler in list.active_handlers() {
            list.mark_consumed(&handler);
        }
        assert!(list.active_handlers().is_empty());

        assert_eq!(list.restore(), 2);
        assert_eq!(
            headers(&list.active_handlers()),
            vec!["runtime", "initial"]
        );
    }
}
