//! Codec module - serialization of mock response bodies.
//!
//! - [`JsonCodec`] - JSON using `serde_json`
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`, struct-as-map)
//!
//! Codecs are marker structs with static methods; [`MockResponse`](crate::MockResponse)
//! uses them for its `json`/`msgpack` constructors and body decoders.
//!
//! # Example
//!
//! ```
//! use mockwire::codec::{JsonCodec, MsgPackCodec};
//!
//! let json = JsonCodec::encode(&vec![1, 2, 3]).unwrap();
//! assert_eq!(&json[..], b"[1,2,3]");
//!
//! let packed = MsgPackCodec::encode(&"hello").unwrap();
//! let decoded: String = MsgPackCodec::decode(&packed).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;
mod msgpack;

pub use json::{JsonCodec, JSON_CONTENT_TYPE};
pub use msgpack::{MsgPackCodec, MSGPACK_CONTENT_TYPE};
