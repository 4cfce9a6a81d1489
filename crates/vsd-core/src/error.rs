//! Validation error types

use thiserror::Error;

/// Reasons a reservation service response is rejected as not answering
/// the request that produced it.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Response body could not be parsed into the expected envelope
    #[error("failed to parse response payload: {0}")]
    Malformed(String),

    /// Embedded vehicle id does not match the id that was requested
    #[error("response data does not match the owned vehicle id")]
    IdentityMismatch,

    /// Submit acknowledgement is missing the acknowledged lock value
    #[error("failed to parse lock_flg retrieved from server")]
    MissingAck,
}
