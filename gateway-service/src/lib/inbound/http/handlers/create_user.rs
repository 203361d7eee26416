use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::get_user::UserData;
use super::ApiError;
use super::ApiSuccess;
use crate::identity::errors::EmailError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::errors::TokenLifetimeError;
use crate::identity::models::CreateIdentityCommand;
use crate::identity::models::EmailAddress;
use crate::identity::models::Password;
use crate::identity::models::PersonName;
use crate::identity::models::TokenLifetime;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

const DEFAULT_TOKEN_LIFETIME_HOURS: i32 = 8;

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .identity_service
        .create_identity(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref identity| ApiSuccess::new(StatusCode::CREATED, identity.into()))
}

/// HTTP request body for registering a user (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    token_lifetime_hours: Option<i32>,
}

#[derive(Debug, Clone, Error)]
enum ParseCreateUserRequestError {
    #[error("Invalid name: {0}")]
    Name(#[from] NameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Weak password: {0}")]
    Password(#[from] PasswordPolicyError),

    #[error("Invalid token lifetime: {0}")]
    TokenLifetime(#[from] TokenLifetimeError),
}

impl CreateUserRequest {
    fn try_into_command(self) -> Result<CreateIdentityCommand, ParseCreateUserRequestError> {
        Ok(CreateIdentityCommand {
            first_name: PersonName::new(self.first_name.trim().to_string())?,
            last_name: PersonName::new(self.last_name.trim().to_string())?,
            email: EmailAddress::new(self.email.trim().to_string())?,
            password: Password::new(self.password)?,
            token_lifetime: TokenLifetime::new(
                self.token_lifetime_hours
                    .unwrap_or(DEFAULT_TOKEN_LIFETIME_HOURS),
            )?,
        })
    }
}

impl From<ParseCreateUserRequestError> for ApiError {
    fn from(err: ParseCreateUserRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
