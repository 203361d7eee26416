use thiserror::Error;

/// Error type for RSA key material operations.
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Unsupported key format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Key has no private parameters")]
    MissingPrivateParameters,

    #[error("Key generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}
