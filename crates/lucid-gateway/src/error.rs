//! Error types for the gateway layer.

use lucid_protocol::ProtocolError;
use lucid_transport::{Method, TransportError};

/// Errors returned by [`RequestGateway`](crate::RequestGateway).
///
/// The first four are raised locally, before any network I/O.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No session: credential or address missing.
    #[error("you must be logged in to request a key-value pair")]
    NotAuthenticated,

    /// A body was supplied with GET, DELETE or HEAD.
    #[error("can't send a request body with {method}; GET, DELETE and HEAD take none")]
    InvalidRequestShape { method: Method },

    /// PUT without a body.
    #[error("a PUT request must have a body")]
    MissingBody,

    /// `.` and `..` would address `/kv` itself, not a key under it.
    #[error("{key:?} is not a valid key")]
    InvalidKey { key: String },

    /// The server answered with a non-2xx status.
    #[error("Error {status} - {message}")]
    RemoteError { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl GatewayError {
    /// `true` for errors raised before anything was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::InvalidRequestShape { .. }
                | Self::MissingBody
                | Self::InvalidKey { .. }
        )
    }
}
