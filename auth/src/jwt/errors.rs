use thiserror::Error;

use crate::keys::KeyError;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(#[from] KeyError),
}
