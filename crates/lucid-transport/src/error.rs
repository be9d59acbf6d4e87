/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, refused connection,
    /// TLS failure, reset mid-flight).
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built (bad header name or value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
