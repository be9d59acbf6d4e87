//! Error types for the session layer.

use lucid_protocol::ServerAddress;

/// Errors raised by validators and session transitions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The endpoint probe never got an answer (DNS, refused connection,
    /// timeout).
    #[error("endpoint {address} did not answer the request: {reason}")]
    EndpointUnreachable {
        address: ServerAddress,
        reason: String,
    },

    /// The endpoint answered, but not like a Lucid server: non-2xx status
    /// or a body without the version signature.
    #[error("endpoint {address} could not be determined to be a Lucid endpoint: {reason}")]
    EndpointInvalid {
        address: ServerAddress,
        reason: String,
    },

    /// The server did not accept the credential. `status` is `None` when
    /// the check ran out of time before any status was received.
    #[error("{}", describe_token_failure(.status, .message))]
    TokenInvalid {
        status: Option<u16>,
        message: String,
    },

    /// Another transition is still in flight.
    #[error("another session transition is already in progress")]
    SessionBusy,

    /// `login` or `set_endpoint` was attempted while logged in.
    #[error("already logged in; log out first")]
    AlreadyLoggedIn,

    /// The store was closed; the transition's result was discarded.
    #[error("session store is closed")]
    Closed,
}

fn describe_token_failure(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("Error {status} - {message}"),
        None => format!("Error - {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_invalid_display_with_status() {
        let err = SessionError::TokenInvalid {
            status: Some(401),
            message: "Invalid JWT token in Authorization header.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Error 401 - Invalid JWT token in Authorization header."
        );
    }

    #[test]
    fn test_token_invalid_display_without_status() {
        let err = SessionError::TokenInvalid {
            status: None,
            message: "timed out".into(),
        };
        assert_eq!(err.to_string(), "Error - timed out");
    }
}
