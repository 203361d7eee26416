use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::errors::CatalogError;
use crate::catalog::models::NewService;
use crate::catalog::models::RegisterServiceCommand;
use crate::catalog::models::ServiceEndpoint;
use crate::catalog::models::ServiceRecord;
use crate::catalog::models::UpdateServiceCommand;

/// Port for service registry management.
#[async_trait]
pub trait ServiceCatalogPort: Send + Sync + 'static {
    /// List every registered service with its permission names.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_services(&self) -> Result<Vec<ServiceRecord>, CatalogError>;

    /// Register a backend and generate its keypair.
    ///
    /// # Returns
    /// Registered service
    ///
    /// # Errors
    /// * `InvalidPermission` - A permission name is blank or too long
    /// * `DuplicatePermission` - A permission name appears twice
    /// * `NameAlreadyExists` - Name is already registered
    /// * `CredentialError` - Key generation failed
    /// * `DatabaseError` - Database operation failed
    async fn register_service(
        &self,
        command: RegisterServiceCommand,
    ) -> Result<ServiceRecord, CatalogError>;

    /// Change description, host, port and active flag.
    ///
    /// # Errors
    /// * `NotFound` - No service with this identifier
    /// * `DatabaseError` - Database operation failed
    async fn update_service(
        &self,
        identifier: Uuid,
        command: UpdateServiceCommand,
    ) -> Result<(), CatalogError>;
}

/// Persistence operations for registered services.
#[async_trait]
pub trait ServiceRepository: Send + Sync + 'static {
    async fn list_all(&self) -> Result<Vec<ServiceRecord>, CatalogError>;

    /// Persist a new service with its permissions.
    ///
    /// # Errors
    /// * `NameAlreadyExists` - Name is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, service: NewService) -> Result<ServiceRecord, CatalogError>;

    /// # Errors
    /// * `NotFound` - No service with this identifier
    /// * `DatabaseError` - Database operation failed
    async fn update(
        &self,
        identifier: Uuid,
        command: &UpdateServiceCommand,
    ) -> Result<(), CatalogError>;
}

/// Name-based lookup used to route proxied requests.
#[async_trait]
pub trait ServiceRegistry: Send + Sync + 'static {
    /// Resolve a backend by its exact name (None if not registered).
    async fn get_by_name(&self, name: &str) -> Result<Option<ServiceEndpoint>, CatalogError>;
}
