//! Intercepted request model.
//!
//! A [`MockRequest`] is the value predicates are tested against and resolvers
//! receive. It is built by the transport collaborator from whatever it captured.
//!
//! # Example
//!
//! ```
//! use mockwire::{Method, MockRequest};
//!
//! let request = MockRequest::new(Method::Get, "/book/42?lang=en")
//!     .header("Accept", "application/json");
//!
//! assert_eq!(request.path(), "/book/42");
//! assert_eq!(request.query_param("lang"), Some("en"));
//! assert_eq!(request.header_value("accept"), Some("application/json"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::codec::{JsonCodec, JSON_CONTENT_TYPE};
use crate::error::{MockError, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(MockError::UnknownMethod(s.to_string())),
        }
    }
}

/// An intercepted request.
///
/// Header names are stored lower-cased, so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: BTreeMap<String, String>,
    body: Bytes,
}

impl MockRequest {
    /// Create a request from a method and a target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, Vec::new()),
        };

        Self {
            method,
            path: normalize_path(path),
            query,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(target: &str) -> Self {
        Self::new(Method::Get, target)
    }

    /// Shorthand for a `POST` request.
    pub fn post(target: &str) -> Self {
        Self::new(Method::Post, target)
    }

    /// Add a header (name is case-insensitive).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and the matching content type.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self> {
        let body = JsonCodec::encode(value)?;
        Ok(self.header("content-type", JSON_CONTENT_TYPE).body(body))
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the first value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Raw body bytes.
    #[inline]
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode(&self.body)
    }
}

impl fmt::Display for MockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Strip a trailing slash (except for the root) so `/book/` and `/book` compare equal.
fn normalize_path(path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path,
    }
}

/// Decode `application/x-www-form-urlencoded` pairs (`%20` and `+` become spaces).
fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Delete".parse::<Method>().unwrap(), Method::Delete);
        let err = "BREW".parse::<Method>().unwrap_err();
        assert!(matches!(err, MockError::UnknownMethod(ref m) if m == "BREW"));
        assert_eq!(err.to_string(), "Unknown HTTP method \"BREW\"");
    }

    #[test]
    fn test_target_splits_path_and_query() {
        let request = MockRequest::get("/books?page=2&sort=title&flag");

        assert_eq!(request.path(), "/books");
        assert_eq!(request.query_param("page"), Some("2"));
        assert_eq!(request.query_param("sort"), Some("title"));
        assert_eq!(request.query_param("flag"), Some(""));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn test_query_values_are_decoded() {
        let request = MockRequest::get("/search?q=a%20b&tag=rust+async&name=%C3%A9");

        assert_eq!(request.query_param("q"), Some("a b"));
        assert_eq!(request.query_param("tag"), Some("rust async"));
        assert_eq!(request.query_param("name"), Some("é"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(MockRequest::get("/book/").path(), "/book");
        assert_eq!(MockRequest::get("book/1").path(), "/book/1");
        assert_eq!(MockRequest::get("/").path(), "/");
    }

    #[test]
    fn test_headers_case_insensitive() {
        let request = MockRequest::get("/").header("X-Request-Id", "abc");

        assert_eq!(request.header_value("x-request-id"), Some("abc"));
        assert_eq!(request.header_value("X-REQUEST-ID"), Some("abc"));
    }

    #[test]
    fn test_json_body() {
        let request = MockRequest::post("/book/42/reviews")
            .json(&serde_json::json!({ "stars": 5 }))
            .unwrap();

        assert_eq!(request.header_value("content-type"), Some(JSON_CONTENT_TYPE));
        let body: serde_json::Value = request.json_body().unwrap();
        assert_eq!(body["stars"], 5);
    }

    #[test]
    fn test_display() {
        assert_eq!(MockRequest::post("/book/1").to_string(), "POST /book/1");
    }
}
