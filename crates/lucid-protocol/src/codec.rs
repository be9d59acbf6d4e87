//! Payload encoding.
//!
//! The session projection written to durable storage and the bodies sent by
//! `store_json` both go through a [`Codec`], so the on-disk and on-wire
//! format is decided in one place.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts values to and from the bytes sent to (or stored for) a server.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` a server should be told when receiving
    /// bytes produced by this codec.
    fn content_type(&self) -> &'static str;

    /// # Errors
    /// [`ProtocolError::Encode`] when `value` can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// [`ProtocolError::Decode`] for malformed input or a shape that
    /// doesn't match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// JSON via `serde_json`. The only format a Lucid server understands
/// for structured values.
///
/// ## Example
///
/// ```rust
/// use lucid_protocol::{Codec, ErrorBody, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&ErrorBody { message: "not found".into() }).unwrap();
/// let decoded: ErrorBody = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded.message, "not found");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
