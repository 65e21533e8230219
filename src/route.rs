//! Route predicate: method + path template.
//!
//! Template syntax:
//! - `/book/42` literal segments
//! - `/book/:id` captures one segment as `id`
//! - `/static/*` matches any remainder (at least one segment), captured as `*`
//!
//! Query strings are never part of a route; inspect them in a custom predicate.
//!
//! # Example
//!
//! ```
//! use mockwire::{MockRequest, Predicate, Route};
//!
//! let route = Route::get("/book/:id").unwrap();
//! let request = MockRequest::get("/book/42");
//!
//! assert!(route.matches(&request).unwrap());
//! assert_eq!(route.params(&request).get("id").map(String::as_str), Some("42"));
//! ```

use std::collections::BTreeMap;

use crate::error::{MockError, Result};
use crate::handler::Predicate;
use crate::request::{Method, MockRequest};

/// Parameters captured from a request path.
pub type PathParams = BTreeMap<String, String>;

/// Key under which a trailing `*` stores the matched remainder.
pub const WILDCARD_PARAM: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A method (or any method) plus a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Option<Method>,
    pattern: String,
    segments: Vec<Segment>,
}

impl Route {
    /// Parse a route. `method = None` matches every method.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::InvalidRoute`] if the pattern does not start with
    /// `/`, has an unnamed `:` parameter, a duplicate parameter name, or a `*`
    /// that is not the last segment.
    pub fn new(method: Option<Method>, pattern: &str) -> Result<Self> {
        if !pattern.starts_with('/') {
            return Err(MockError::InvalidRoute(pattern.to_string()));
        }

        let raw: Vec<&str> = split_segments(pattern).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (index, part) in raw.iter().enumerate() {
            let segment = if *part == "*" {
                if index + 1 != raw.len() {
                    return Err(MockError::InvalidRoute(pattern.to_string()));
                }
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                if name.is_empty() || duplicate {
                    return Err(MockError::InvalidRoute(pattern.to_string()));
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Literal((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            method,
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn get(pattern: &str) -> Result<Self> {
        Self::new(Some(Method::Get), pattern)
    }

    pub fn post(pattern: &str) -> Result<Self> {
        Self::new(Some(Method::Post), pattern)
    }

    pub fn put(pattern: &str) -> Result<Self> {
        Self::new(Some(Method::Put), pattern)
    }

    pub fn patch(pattern: &str) -> Result<Self> {
        Self::new(Some(Method::Patch), pattern)
    }

    pub fn delete(pattern: &str) -> Result<Self> {
        Self::new(Some(Method::Delete), pattern)
    }

    /// Route matching every method.
    pub fn any(pattern: &str) -> Result<Self> {
        Self::new(None, pattern)
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match the path, returning captured parameters on success.
    fn capture(&self, request: &MockRequest) -> Option<PathParams> {
        if let Some(method) = self.method {
            if request.method() != method {
                return None;
            }
        }

        let mut params = PathParams::new();
        let mut parts = split_segments(request.path());

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    if parts.next()? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), parts.next()?.to_string());
                }
                Segment::Wildcard => {
                    let rest: Vec<&str> = parts.by_ref().collect();
                    if rest.is_empty() {
                        return None;
                    }
                    params.insert(WILDCARD_PARAM.to_string(), rest.join("/"));
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl Predicate for Route {
    fn matches(&self, request: &MockRequest) -> Result<bool> {
        Ok(self.capture(request).is_some())
    }

    fn params(&self, request: &MockRequest) -> PathParams {
        self.capture(request).unwrap_or_default()
    }

    fn describe(&self) -> String {
        match self.method {
            Some(method) => format!("{} {}", method, self.pattern),
            None => format!("ALL {}", self.pattern),
        }
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(route: &Route, request: &MockRequest) -> bool {
        route.matches(request).unwrap()
    }

    #[test]
    fn test_literal_route() {
        let route = Route::get("/books").unwrap();

        assert!(matches(&route, &MockRequest::get("/books")));
        assert!(matches(&route, &MockRequest::get("/books/?page=2")));
        assert!(!matches(&route, &MockRequest::get("/books/1")));
        assert!(!matches(&route, &MockRequest::post("/books")));
    }

    #[test]
    fn test_param_capture() {
        let route = Route::post("/book/:id/reviews").unwrap();
        let request = MockRequest::post("/book/42/reviews");

        assert!(matches(&route, &request));
        let params = route.params(&request);
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(!matches(&route, &MockRequest::post("/book/42")));
    }

    #[test]
    fn test_wildcard_remainder() {
        let route = Route::any("/static/*").unwrap();
        let request = MockRequest::get("/static/css/site.css");

        assert!(matches(&route, &request));
        assert_eq!(
            route.params(&request).get(WILDCARD_PARAM).map(String::as_str),
            Some("css/site.css")
        );
        assert!(!matches(&route, &MockRequest::get("/static")));
    }

    #[test]
    fn test_any_method() {
        let route = Route::any("/ping").unwrap();

        assert!(matches(&route, &MockRequest::get("/ping")));
        assert!(matches(&route, &MockRequest::new(Method::Delete, "/ping")));
        assert_eq!(route.describe(), "ALL /ping");
    }

    #[test]
    fn test_root_route() {
        let route = Route::get("/").unwrap();

        assert!(matches(&route, &MockRequest::get("/")));
        assert!(!matches(&route, &MockRequest::get("/x")));
    }

    #[test]
    fn test_describe() {
        assert_eq!(Route::get("/book/:id").unwrap().describe(), "GET /book/:id");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(Route::get("book"), Err(MockError::InvalidRoute(_))));
        assert!(Route::get("/book/:").is_err());
        assert!(Route::get("/a/:id/b/:id").is_err());
        assert!(Route::get("/*/tail").is_err());
    }

    #[test]
    fn test_params_empty_on_mismatch() {
        let route = Route::get("/book/:id").unwrap();
        assert!(route.params(&MockRequest::get("/author/1")).is_empty());
    }
}
