//! Mock response model and the resolver result type.
//!
//! # Example
//!
//! ```
//! use mockwire::MockResponse;
//!
//! let response = MockResponse::json(&serde_json::json!({ "id": 42 }))
//!     .unwrap()
//!     .with_header("x-mocked", "1");
//!
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.header_value("content-type"), Some("application/json"));
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Serialize;

use crate::codec::{JsonCodec, MsgPackCodec, JSON_CONTENT_TYPE, MSGPACK_CONTENT_TYPE};
use crate::error::Result;

/// A mock response produced by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Bytes,
}

impl MockResponse {
    /// Empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// `200` response with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::status(200)
            .with_header("content-type", "text/plain")
            .with_body(Bytes::from(body.into()))
    }

    /// `200` response with a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        let body = JsonCodec::encode(value)?;
        Ok(Self::status(200)
            .with_header("content-type", JSON_CONTENT_TYPE)
            .with_body(body))
    }

    /// `200` response with a MessagePack body (struct-as-map).
    pub fn msgpack<T: Serialize>(value: &T) -> Result<Self> {
        let body = MsgPackCodec::encode(value)?;
        Ok(Self::status(200)
            .with_header("content-type", MSGPACK_CONTENT_TYPE)
            .with_body(body))
    }

    /// Override the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header (name is case-insensitive).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// All headers, lower-cased names in sorted order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode(&self.body)
    }

    /// Decode the body as MessagePack.
    pub fn msgpack_body<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        MsgPackCodec::decode(&self.body)
    }
}

/// What a resolver decided for a request its handler matched.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Answer the request with this response.
    Respond(MockResponse),
    /// Decline; the engine keeps scanning with the next handler.
    Pass,
}

impl From<MockResponse> for Resolution {
    fn from(response: MockResponse) -> Self {
        Resolution::Respond(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_is_empty() {
        let response = MockResponse::status(500);

        assert_eq!(response.status_code(), 500);
        assert!(response.body().is_empty());
        assert_eq!(response.headers().count(), 0);
    }

    #[test]
    fn test_text_response() {
        let response = MockResponse::text("hello").with_status(201);

        assert_eq!(response.status_code(), 201);
        assert_eq!(response.header_value("Content-Type"), Some("text/plain"));
        assert_eq!(&response.body()[..], b"hello");
    }

    #[test]
    fn test_msgpack_response_body() {
        let response = MockResponse::msgpack(&vec!["a", "b"]).unwrap();

        assert_eq!(
            response.header_value("content-type"),
            Some(MSGPACK_CONTENT_TYPE)
        );
        let decoded: Vec<String> = response.msgpack_body().unwrap();
        assert_eq!(decoded, vec!["a", "b"]);
    }

    #[test]
    fn test_resolution_from_response() {
        let resolution: Resolution = MockResponse::status(204).into();
        assert_eq!(resolution, Resolution::Respond(MockResponse::status(204)));
    }
}
