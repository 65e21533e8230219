//! MsgPack codec using `rmp-serde`.
//!
//! Always encodes with `to_vec_named` so structs become maps with field names,
//! which is what JavaScript MessagePack decoders on the consuming side expect.

use bytes::Bytes;

use crate::error::Result;

/// Content type written by MessagePack mock responses.
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

/// MessagePack codec for structured response bodies.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes (struct-as-map format).
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Bytes> {
        // to_vec_named, NOT to_vec
        Ok(Bytes::from(rmp_serde::to_vec_named(value)?))
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
