use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::catalog::errors::CatalogError;
use crate::identity::errors::IdentityError;
use crate::proxy::errors::ProxyError;

pub mod authenticate;
pub mod create_user;
pub mod get_user;
pub mod list_services;
pub mod proxy;
pub mod register_service;
pub mod reset_password;
pub mod update_service;
pub mod update_user;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Error response.
///
/// Internal detail is logged and never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(_) => ApiError::NotFound(err.to_string()),
            IdentityError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            IdentityError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            IdentityError::InvalidEmail(_)
            | IdentityError::InvalidName(_)
            | IdentityError::WeakPassword(_)
            | IdentityError::InvalidTokenLifetime(_)
            | IdentityError::DuplicateServiceGrant(_)
            | IdentityError::DuplicatePermissionGrant { .. }
            | IdentityError::UnknownService(_)
            | IdentityError::UnknownPermission { .. } => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            IdentityError::CredentialError(_)
            | IdentityError::DatabaseError(_)
            | IdentityError::Unknown(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CatalogError::NameAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            CatalogError::InvalidName(_)
            | CatalogError::InvalidHost(_)
            | CatalogError::InvalidPort(_)
            | CatalogError::InvalidPermission(_)
            | CatalogError::DuplicatePermission(_) => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            CatalogError::CredentialError(_)
            | CatalogError::DatabaseError(_)
            | CatalogError::Unknown(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::ServiceNotFound(_) => ApiError::NotFound("Service not found".to_string()),
            ProxyError::ServiceUnavailable(_) => {
                ApiError::ServiceUnavailable("Service unavailable".to_string())
            }
            ProxyError::Unauthenticated => ApiError::Unauthorized("Unauthenticated".to_string()),
            ProxyError::Forbidden(_) => ApiError::Forbidden("Forbidden".to_string()),
            ProxyError::InvalidRequest(_)
            | ProxyError::UpstreamFailed(_)
            | ProxyError::Internal(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
