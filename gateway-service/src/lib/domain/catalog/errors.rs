use thiserror::Error;

/// Error for ServiceName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceNameError {
    #[error("Service name too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Service name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Service name contains invalid characters (letters, digits, space and _ . , - allowed)"
    )]
    InvalidCharacters,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("Host is empty")]
    Empty,

    #[error("Host contains invalid characters: {0}")]
    InvalidCharacters(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("Port out of range 1-65535: {0}")]
    OutOfRange(i64),
}

/// Top-level error for service registry operations
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Invalid service name: {0}")]
    InvalidName(#[from] ServiceNameError),

    #[error("Invalid host: {0}")]
    InvalidHost(#[from] HostError),

    #[error("Invalid port: {0}")]
    InvalidPort(#[from] PortError),

    #[error("Invalid permission name: {0:?}")]
    InvalidPermission(String),

    #[error("Permission defined more than once: {0}")]
    DuplicatePermission(String),

    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Service name already exists: {0}")]
    NameAlreadyExists(String),

    #[error("Credential material error: {0}")]
    CredentialError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<auth::KeyError> for CatalogError {
    fn from(err: auth::KeyError) -> Self {
        CatalogError::CredentialError(err.to_string())
    }
}
