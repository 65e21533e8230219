//! Handler module - handler definitions and the ordered handler list.
//!
//! Provides:
//! - [`Handler`] - predicate + resolver + lifecycle record
//! - [`HandlerList`] - ordered initial/runtime handlers with one-time consumption
//! - [`RequestContext`] - what a resolver receives, with response helpers
//!
//! # Example
//!
//! ```
//! use mockwire::handler::HandlerList;
//! use mockwire::{Handler, MockResponse, Route};
//!
//! let list = HandlerList::new(vec![
//!     Handler::new(Route::get("/book/:id").unwrap(), |ctx| async move {
//!         ctx.text(format!("book {}", ctx.param("id").unwrap_or_default()))
//!     }),
//! ]);
//!
//! // Runtime override, answered once
//! list.prepend(vec![Handler::respond_once(
//!     Route::get("/book/:id").unwrap(),
//!     MockResponse::status(500),
//! )]);
//! assert_eq!(list.len(), 2);
//! ```

mod context;
mod definition;
mod list;

pub use context::RequestContext;
pub use definition::{
    BoxFuture, FnResolver, Handler, HandlerId, HandlerInfo, Lifecycle, Predicate, Resolver,
    ResolverResult, TryPredicate,
};
pub use list::HandlerList;

pub(crate) use definition::Claim;
