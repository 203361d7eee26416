use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::identity::errors::IdentityError;
use crate::identity::models::Password;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

/// Optional body; without a password one is generated.
#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPasswordResponseData {
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    body: Option<Json<ResetPasswordRequest>>,
) -> Result<ApiSuccess<ResetPasswordResponseData>, ApiError> {
    let Json(body) = body.unwrap_or_default();
    let password = body
        .password
        .map(Password::new)
        .transpose()
        .map_err(IdentityError::from)?;

    state
        .identity_service
        .reset_password(user_id, password)
        .await
        .map_err(ApiError::from)
        .map(|password| ApiSuccess::new(StatusCode::OK, ResetPasswordResponseData { password }))
}
