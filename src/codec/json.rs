//! JSON codec using `serde_json`.

use bytes::Bytes;

use crate::error::Result;

/// Content type written by JSON mock responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// JSON codec for structured response bodies.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    /// Decode JSON bytes to a value.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Book {
        id: u32,
        title: String,
    }

    #[test]
    fn test_encode_struct_as_object() {
        let book = Book {
            id: 42,
            title: "Dune".to_string(),
        };

        let encoded = JsonCodec::encode(&book).unwrap();
        assert_eq!(&encoded[..], br#"{"id":42,"title":"Dune"}"#);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let result: Result<Book> = JsonCodec::decode(b"{not json");
        assert!(matches!(result, Err(crate::MockError::Json(_))));
    }
}
