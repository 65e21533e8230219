//! Request context for resolvers.
//!
//! Provides helpers for producing a [`Resolution`]:
//! - `respond` - answer with a prepared response
//! - `status` - answer with an empty response
//! - `text` - answer with a plain-text body
//! - `json` - answer with a JSON body
//! - `pass` - decline, letting the next matching handler answer
//!
//! # Example
//!
//! ```ignore
//! Handler::new(Route::get("/book/:id")?, |ctx| async move {
//!     if ctx.param("id") == Some("0") {
//!         return ctx.pass();
//!     }
//!     ctx.json(&Book { id: ctx.param("id").unwrap_or_default().to_string() })
//! });
//! ```

use serde::Serialize;

use super::{HandlerInfo, ResolverResult};
use crate::events::RequestId;
use crate::request::MockRequest;
use crate::response::{MockResponse, Resolution};
use crate::route::PathParams;

/// Context passed to resolvers.
///
/// Owns a copy of the request, so resolver futures can be `'static` and
/// suspend freely.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Resolution this context belongs to.
    request_id: RequestId,
    /// The intercepted request.
    request: MockRequest,
    /// Parameters captured by the handler predicate.
    params: PathParams,
    /// The handler being run.
    handler: HandlerInfo,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: RequestId,
        request: MockRequest,
        params: PathParams,
        handler: HandlerInfo,
    ) -> Self {
        Self {
            request_id,
            request,
            params,
            handler,
        }
    }

    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    pub fn request(&self) -> &MockRequest {
        &self.request
    }

    /// Get a captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|v| v.as_str())
    }

    #[inline]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Info of the handler running this resolver.
    #[inline]
    pub fn handler(&self) -> &HandlerInfo {
        &self.handler
    }

    /// Answer with the given response.
    pub fn respond(&self, response: MockResponse) -> ResolverResult {
        Ok(Resolution::Respond(response))
    }

    /// Answer with an empty response.
    pub fn status(&self, status: u16) -> ResolverResult {
        self.respond(MockResponse::status(status))
    }

    /// Answer with a `200` plain-text response.
    pub fn text(&self, body: impl Into<String>) -> ResolverResult {
        self.respond(MockResponse::text(body))
    }

    /// Answer with a `200` JSON response.
    pub fn json<T: Serialize>(&self, value: &T) -> ResolverResult {
        Ok(Resolution::Respond(MockResponse::json(value)?))
    }

    /// Decline this request.
    pub fn pass(&self) -> ResolverResult {
        Ok(Resolution::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Lifecycle;

    fn context(params: &[(&str, &str)]) -> RequestContext {
        let params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let handler = crate::Handler::respond(|_: &MockRequest| true, MockResponse::status(200));
        RequestContext::new(
            RequestId::new(7),
            MockRequest::get("/book/42"),
            params,
            handler.info(),
        )
    }

    #[test]
    fn test_context_accessors() {
        let ctx = context(&[("id", "42")]);

        assert_eq!(ctx.request_id(), RequestId::new(7));
        assert_eq!(ctx.request().path(), "/book/42");
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("missing"), None);
        assert_eq!(ctx.handler().lifecycle, Lifecycle::Permanent);
    }

    #[test]
    fn test_response_helpers() {
        let ctx = context(&[]);

        assert_eq!(
            ctx.status(404).unwrap(),
            Resolution::Respond(MockResponse::status(404))
        );
        assert_eq!(
            ctx.text("hi").unwrap(),
            Resolution::Respond(MockResponse::text("hi"))
        );
        assert_eq!(ctx.pass().unwrap(), Resolution::Pass);

        match ctx.json(&serde_json::json!({ "ok": true })).unwrap() {
            Resolution::Respond(response) => {
                let body: serde_json::Value = response.json_body().unwrap();
                assert_eq!(body["ok"], true);
            }
            Resolution::Pass => panic!("expected a response"),
        }
    }

    #[test]
    fn test_context_is_clone() {
        let ctx = context(&[("id", "1")]);
        let ctx2 = ctx.clone();

        assert_eq!(ctx.request_id(), ctx2.request_id());
        assert_eq!(ctx.params(), ctx2.params());
    }
}
