//! Unified error type for the Lucid client.

use lucid_gateway::GatewayError;
use lucid_protocol::ProtocolError;
use lucid_session::SessionError;
use lucid_transport::TransportError;

use crate::PersistenceError;

/// Any error the client can return.
///
/// Every layer keeps its own error enum; this one wraps them all, so
/// hosts match on a single type and `?` converts the rest.
#[derive(Debug, thiserror::Error)]
pub enum LucidError {
    /// No response could be obtained (connection, timeout, body).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Bad server address, or a payload that wouldn't encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login, endpoint or credential validation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A key-value request was refused locally or by the server.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The session state file couldn't be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A configuration value couldn't be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
