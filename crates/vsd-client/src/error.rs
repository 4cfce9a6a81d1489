//! Error types for reservation service operations

use thiserror::Error;

/// Result type alias for reservation client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Classified outcome of a failed remote operation.
///
/// Raw transport errors never cross this boundary: callers see either a
/// network-level failure or the non-success HTTP status, nothing else.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid base URL
    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Access token contains bytes that cannot form a header value
    #[error("invalid access token")]
    InvalidToken,

    /// IO error (only produced by the in-process testing stub)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure (DNS, connect, timeout, read)
    #[error("unable to communicate with the server: {0}")]
    Network(#[source] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("server returned an error code: {0}")]
    Status(u16),
}
