use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use auth::KeyCodec;
use auth::RsaKeyPair;
use uuid::Uuid;

use crate::catalog::errors::CatalogError;
use crate::catalog::models::NewService;
use crate::catalog::models::RegisterServiceCommand;
use crate::catalog::models::ServiceRecord;
use crate::catalog::models::UpdateServiceCommand;
use crate::catalog::ports::ServiceCatalogPort;
use crate::catalog::ports::ServiceRepository;

const MAX_PERMISSION_LENGTH: usize = 96;

/// Domain service for registering and maintaining backends.
pub struct ServiceCatalog<SR>
where
    SR: ServiceRepository,
{
    repository: Arc<SR>,
}

impl<SR> ServiceCatalog<SR>
where
    SR: ServiceRepository,
{
    pub fn new(repository: Arc<SR>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<SR> ServiceCatalogPort for ServiceCatalog<SR>
where
    SR: ServiceRepository,
{
    async fn list_services(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        self.repository.list_all().await
    }

    async fn register_service(
        &self,
        command: RegisterServiceCommand,
    ) -> Result<ServiceRecord, CatalogError> {
        let permissions = normalize_permissions(command.permissions)?;

        let keys = tokio::task::spawn_blocking(RsaKeyPair::generate)
            .await
            .map_err(|e| CatalogError::Unknown(format!("Key generation task failed: {}", e)))??;

        let service = NewService {
            identifier: Uuid::new_v4(),
            name: command.name.as_str().to_string(),
            description: command.description,
            host: command.host.as_str().to_string(),
            port: command.port.get(),
            permissions,
            public_key: KeyCodec::encode(&keys.public),
            private_key: KeyCodec::encode(&keys.private),
        };

        let created = self.repository.create(service).await?;

        tracing::info!(
            service = %created.name,
            identifier = %created.identifier,
            host = %created.host,
            port = created.port,
            permissions = created.permissions.len(),
            "Service registered"
        );

        Ok(created)
    }

    async fn update_service(
        &self,
        identifier: Uuid,
        command: UpdateServiceCommand,
    ) -> Result<(), CatalogError> {
        self.repository.update(identifier, &command).await?;

        tracing::info!(
            identifier = %identifier,
            host = %command.host.as_str(),
            port = command.port.get(),
            active = command.active,
            "Service updated"
        );

        Ok(())
    }
}

fn normalize_permissions(permissions: Vec<String>) -> Result<Vec<String>, CatalogError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(permissions.len());

    for permission in permissions {
        let permission = permission.trim().to_string();
        if permission.is_empty() || permission.chars().count() > MAX_PERMISSION_LENGTH {
            return Err(CatalogError::InvalidPermission(permission));
        }
        if !seen.insert(permission.clone()) {
            return Err(CatalogError::DuplicatePermission(permission));
        }
        normalized.push(permission);
    }

    Ok(normalized)
}
