use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::list_services::ServiceData;
use super::ApiError;
use super::ApiSuccess;
use crate::catalog::errors::CatalogError;
use crate::catalog::models::RegisterServiceCommand;
use crate::catalog::models::ServiceHost;
use crate::catalog::models::ServiceName;
use crate::catalog::models::ServicePort;
use crate::catalog::ports::ServiceCatalogPort;
use crate::inbound::http::router::AppState;

/// HTTP request body for registering a backend (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterServiceRequest {
    name: String,
    #[serde(default)]
    description: String,
    host: String,
    port: i64,
    #[serde(default)]
    permissions: Vec<String>,
}

impl RegisterServiceRequest {
    fn try_into_command(self) -> Result<RegisterServiceCommand, CatalogError> {
        Ok(RegisterServiceCommand {
            name: ServiceName::new(self.name.trim().to_string())?,
            description: self.description,
            host: ServiceHost::new(self.host.trim().to_string())?,
            port: ServicePort::new(self.port)?,
            permissions: self.permissions,
        })
    }
}

pub async fn register_service(
    State(state): State<AppState>,
    Json(body): Json<RegisterServiceRequest>,
) -> Result<ApiSuccess<ServiceData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .catalog
        .register_service(command)
        .await
        .map_err(ApiError::from)
        .map(|ref service| ApiSuccess::new(StatusCode::CREATED, service.into()))
}
