use thiserror::Error;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for PersonName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Name contains invalid characters (only letters and spaces allowed)")]
    InvalidCharacters,
}

/// Error for Password strength failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password needs an uppercase letter, a lowercase letter and a digit")]
    MissingCharacterClass,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenLifetimeError {
    #[error("Token lifetime must be at least one hour, got {0}")]
    TooShort(i32),
}

/// Top-level error for all identity-related operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Weak password: {0}")]
    WeakPassword(#[from] PasswordPolicyError),

    #[error("Invalid token lifetime: {0}")]
    InvalidTokenLifetime(#[from] TokenLifetimeError),

    #[error("Service granted more than once: {0}")]
    DuplicateServiceGrant(String),

    #[error("Permission granted more than once on {service}: {permission}")]
    DuplicatePermissionGrant { service: String, permission: String },

    #[error("Granted service is not registered: {0}")]
    UnknownService(String),

    #[error("Granted permission is not defined on {service}: {permission}")]
    UnknownPermission { service: String, permission: String },

    // Domain-level errors
    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Infrastructure errors
    #[error("Credential material error: {0}")]
    CredentialError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<auth::KeyError> for IdentityError {
    fn from(err: auth::KeyError) -> Self {
        IdentityError::CredentialError(err.to_string())
    }
}

impl From<auth::PasswordError> for IdentityError {
    fn from(err: auth::PasswordError) -> Self {
        IdentityError::CredentialError(err.to_string())
    }
}

impl From<auth::JwtError> for IdentityError {
    fn from(err: auth::JwtError) -> Self {
        IdentityError::CredentialError(err.to_string())
    }
}
