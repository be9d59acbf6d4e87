//! Error types for the protocol layer.

/// Errors raised while parsing addresses or converting payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value couldn't be turned into bytes.
    #[cfg(feature = "json")]
    #[error("could not encode payload: {0}")]
    Encode(serde_json::Error),

    /// Bytes didn't hold a value of the expected shape.
    #[cfg(feature = "json")]
    #[error("could not decode payload: {0}")]
    Decode(serde_json::Error),

    /// The string is not usable as a Lucid server address.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// `.` and `..` can't be sent as a path segment: URL normalization
    /// would resolve them against the address instead.
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
}
