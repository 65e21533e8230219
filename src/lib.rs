//! # mockwire
//!
//! Request handler resolution engine for mocking intercepted network requests.
//!
//! For every intercepted request the engine decides which mock handler, if
//! any, answers it. Handlers are predicate + resolver pairs; runtime handlers
//! override the ones supplied at setup, and one-time handlers answer exactly
//! once even under concurrent traffic.
//!
//! ## Architecture
//!
//! - **Handlers** ([`Handler`]): predicate, async resolver, `Permanent` or `OneTime`
//! - **Engine** ([`Engine`]): snapshot, scan, resolve, consume; plus the runtime
//!   surface (`use_handlers`, `reset_handlers`, `restore_handlers`)
//! - **Dispatcher** ([`Dispatcher`]): channel boundary to the transport that
//!   captures requests and applies the engine's [`Decision`]
//!
//! ## Example
//!
//! ```
//! use mockwire::{Engine, Handler, MockRequest, MockResponse, Outcome, Route};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mockwire::MockError> {
//!     let engine = Engine::builder()
//!         .handler(Handler::new(Route::get("/book/:id")?, |ctx| async move {
//!             ctx.json(&serde_json::json!({ "id": ctx.param("id") }))
//!         }))
//!         .build()?;
//!
//!     engine.use_handlers(vec![Handler::respond(
//!         Route::post("/book/:id/reviews")?,
//!         MockResponse::status(201),
//!     )]);
//!
//!     let outcome = engine.resolve(MockRequest::post("/book/42/reviews")).await;
//!     assert_eq!(outcome.response().map(|r| r.status_code()), Some(201));
//!
//!     let outcome = engine.resolve(MockRequest::get("/author/1")).await;
//!     assert_eq!(outcome, Outcome::Unhandled);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;

mod dispatch;
mod engine;
mod request;
mod response;
mod route;

pub use config::{EngineConfig, UnhandledPolicy};
pub use dispatch::{Decision, Dispatcher, InterceptedRequest, Interceptor};
pub use engine::{Engine, EngineBuilder, Outcome};
pub use error::{MockError, Result};
pub use events::{LifecycleEvent, RequestId};
pub use handler::{Handler, HandlerId, HandlerInfo, Lifecycle, Predicate, RequestContext};
pub use request::{Method, MockRequest};
pub use response::{MockResponse, Resolution};
pub use route::{PathParams, Route, WILDCARD_PARAM};
