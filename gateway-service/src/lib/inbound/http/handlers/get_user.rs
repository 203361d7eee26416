use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use super::ApiError;
use super::ApiSuccess;
use crate::identity::models::Identity;
use crate::identity::models::ServiceGrant;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .identity_service
        .get_identity(user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}

/// The caller as asserted by its verified token.
pub async fn get_current_user(
    Extension(AuthenticatedIdentity(identity)): Extension<AuthenticatedIdentity>,
) -> ApiSuccess<UserData> {
    ApiSuccess::new(StatusCode::OK, (&identity).into())
}

/// Identity as exposed over HTTP. Never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: i64,
    pub identifier: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub token_lifetime_hours: i32,
    pub service_grants: Vec<ServiceGrant>,
}

impl From<&Identity> for UserData {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            identifier: identity.identifier,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            active: identity.active,
            token_lifetime_hours: identity.token_lifetime_hours,
            service_grants: identity.service_grants.clone(),
        }
    }
}
