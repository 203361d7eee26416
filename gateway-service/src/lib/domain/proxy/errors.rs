use thiserror::Error;

/// Reasons a proxied request is refused or fails.
///
/// Messages are for logs; callers only see the status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden on service: {0}")]
    Forbidden(String),

    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),

    #[error("Upstream request failed: {0}")]
    UpstreamFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
