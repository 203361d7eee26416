use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::identity::errors::IdentityError;
use crate::identity::models::EmailAddress;
use crate::identity::models::PersonName;
use crate::identity::models::ServiceGrant;
use crate::identity::models::TokenLifetime;
use crate::identity::models::UpdateIdentityCommand;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

/// HTTP request body for replacing a user's profile and grants (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub token_lifetime_hours: i32,
    #[serde(default)]
    pub service_grants: Vec<ServiceGrant>,
}

impl UpdateUserRequest {
    fn try_into_command(self) -> Result<UpdateIdentityCommand, IdentityError> {
        // Validation happens here - errors are automatically converted via #[from]
        Ok(UpdateIdentityCommand {
            first_name: PersonName::new(self.first_name.trim().to_string())?,
            last_name: PersonName::new(self.last_name.trim().to_string())?,
            email: EmailAddress::new(self.email.trim().to_string())?,
            active: self.active,
            token_lifetime: TokenLifetime::new(self.token_lifetime_hours)?,
            service_grants: self.service_grants,
        })
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthenticatedIdentity(caller)): Extension<AuthenticatedIdentity>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    let command = req.try_into_command()?;

    state
        .identity_service
        .update_identity(user_id, command, caller.id)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}
