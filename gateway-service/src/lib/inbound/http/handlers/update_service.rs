use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog::errors::CatalogError;
use crate::catalog::models::ServiceHost;
use crate::catalog::models::ServicePort;
use crate::catalog::models::UpdateServiceCommand;
use crate::catalog::ports::ServiceCatalogPort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// HTTP request body for updating a backend (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    #[serde(default)]
    pub description: String,
    pub host: String,
    pub port: i64,
    pub active: bool,
}

impl UpdateServiceRequest {
    fn try_into_command(self) -> Result<UpdateServiceCommand, CatalogError> {
        Ok(UpdateServiceCommand {
            description: self.description,
            host: ServiceHost::new(self.host.trim().to_string())?,
            port: ServicePort::new(self.port)?,
            active: self.active,
        })
    }
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<StatusCode, ApiError> {
    let identifier =
        Uuid::parse_str(&identifier).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let command = req.try_into_command()?;

    state
        .catalog
        .update_service(identifier, command)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}
