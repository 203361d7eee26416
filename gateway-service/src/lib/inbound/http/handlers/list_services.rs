use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use super::ApiError;
use super::ApiSuccess;
use crate::catalog::models::ServiceRecord;
use crate::catalog::ports::ServiceCatalogPort;
use crate::inbound::http::router::AppState;

pub async fn list_services(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<ServiceData>>, ApiError> {
    state
        .catalog
        .list_services()
        .await
        .map_err(ApiError::from)
        .map(|services| {
            ApiSuccess::new(
                StatusCode::OK,
                services.iter().map(ServiceData::from).collect(),
            )
        })
}

/// Registered backend as exposed over HTTP, public key only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceData {
    pub identifier: Uuid,
    pub name: String,
    pub description: String,
    pub host: String,
    pub port: u16,
    pub active: bool,
    pub public_key: String,
    pub permissions: Vec<String>,
}

impl From<&ServiceRecord> for ServiceData {
    fn from(service: &ServiceRecord) -> Self {
        Self {
            identifier: service.identifier,
            name: service.name.clone(),
            description: service.description.clone(),
            host: service.host.clone(),
            port: service.port,
            active: service.active,
            public_key: service.public_key.clone(),
            permissions: service.permissions.clone(),
        }
    }
}
