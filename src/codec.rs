//! Payload codec for typed handlers.
//!
//! The dispatcher itself never looks inside a payload. Handlers registered
//! with [`RegistryBuilder::typed_method`](crate::handler::RegistryBuilder::typed_method)
//! decode their request with [`MsgPackCodec`] before their body runs.
//!
//! Structs are encoded as maps (`rmp_serde::to_vec_named`) so field order is
//! not part of the payload contract.
//!
//! # Example
//!
//! ```
//! use servicewire::codec::MsgPackCodec;
//!
//! let encoded = MsgPackCodec::encode(&("alice", 7u32)).unwrap();
//! let decoded: (String, u32) = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, ("alice".to_string(), 7));
//! ```

use crate::error::Result;

/// MessagePack codec for structured payloads.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes, structs as maps.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
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
