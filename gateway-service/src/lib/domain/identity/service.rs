use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;
use auth::KeyCodec;
use auth::PasswordHasher;
use auth::RsaKeyPair;
use auth::TokenService;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::identity::errors::IdentityError;
use crate::identity::models::CreateIdentityCommand;
use crate::identity::models::Identity;
use crate::identity::models::IdentitySecrets;
use crate::identity::models::NewIdentity;
use crate::identity::models::Password;
use crate::identity::models::ServiceGrant;
use crate::identity::models::UpdateIdentityCommand;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::IdentityServicePort;
use crate::identity::ports::SecretsStore;

const GENERATED_PASSWORD_LENGTH: usize = 16;

/// Domain service implementation for identity operations.
///
/// Concrete implementation of IdentityServicePort with dependency injection.
pub struct IdentityService<IR, SS>
where
    IR: IdentityRepository,
    SS: SecretsStore,
{
    repository: Arc<IR>,
    secrets: Arc<SS>,
    tokens: TokenService,
    password_hasher: PasswordHasher,
    issuer: String,
}

impl<IR, SS> IdentityService<IR, SS>
where
    IR: IdentityRepository,
    SS: SecretsStore,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Identity persistence implementation
    /// * `secrets` - Credential lookup implementation
    /// * `clock` - Time source for token issuance
    /// * `issuer` - `iss` claim written into issued tokens
    pub fn new(
        repository: Arc<IR>,
        secrets: Arc<SS>,
        clock: Arc<dyn Clock>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            secrets,
            tokens: TokenService::new(clock),
            password_hasher: PasswordHasher::new(),
            issuer: issuer.into(),
        }
    }

    async fn generate_secrets(&self, password: &str) -> Result<IdentitySecrets, IdentityError> {
        let password_hash = self.password_hasher.hash(password)?;

        let keys = tokio::task::spawn_blocking(RsaKeyPair::generate)
            .await
            .map_err(|e| IdentityError::Unknown(format!("Key generation task failed: {}", e)))??;

        Ok(IdentitySecrets {
            password_hash,
            public_key: KeyCodec::encode(&keys.public),
            private_key: KeyCodec::encode(&keys.private),
        })
    }
}

#[async_trait]
impl<IR, SS> IdentityServicePort for IdentityService<IR, SS>
where
    IR: IdentityRepository,
    SS: SecretsStore,
{
    async fn login(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let record = self
            .secrets
            .validate_credential(email, password)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let private_key = record.private_key.as_deref().ok_or_else(|| {
            IdentityError::CredentialError(format!("Identity {} has no private key", record.id))
        })?;
        let private_key = KeyCodec::decode(private_key)?;

        let identity = self
            .repository
            .find_by_id(record.id)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = self.tokens.issue(
            &identity,
            i64::from(identity.token_lifetime_hours),
            &private_key,
            &self.issuer,
        )?;

        tracing::info!(
            identity_id = identity.id,
            lifetime_hours = identity.token_lifetime_hours,
            "Token issued"
        );

        Ok(token)
    }

    async fn create_identity(
        &self,
        command: CreateIdentityCommand,
    ) -> Result<Identity, IdentityError> {
        let secrets = self.generate_secrets(command.password.as_str()).await?;

        let identity = NewIdentity {
            identifier: Uuid::new_v4(),
            first_name: command.first_name.as_str().to_string(),
            last_name: command.last_name.as_str().to_string(),
            email: command.email.as_str().to_string(),
            token_lifetime_hours: command.token_lifetime.hours(),
            secrets,
        };

        let created = self.repository.create(identity).await?;

        tracing::info!(
            identity_id = created.id,
            identifier = %created.identifier,
            "Identity created"
        );

        Ok(created)
    }

    async fn get_identity(&self, id: i64) -> Result<Identity, IdentityError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound(id.to_string()))
    }

    async fn update_identity(
        &self,
        id: i64,
        command: UpdateIdentityCommand,
        granted_by: i64,
    ) -> Result<(), IdentityError> {
        ensure_unique_grants(&command.service_grants)?;

        let mut identity = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound(id.to_string()))?;

        identity.first_name = command.first_name.as_str().to_string();
        identity.last_name = command.last_name.as_str().to_string();
        identity.email = command.email.as_str().to_string();
        identity.active = command.active;
        identity.token_lifetime_hours = command.token_lifetime.hours();
        identity.service_grants = command.service_grants;

        self.repository.update(&identity, granted_by).await?;

        tracing::info!(
            identity_id = id,
            granted_by = granted_by,
            grants = identity.service_grants.len(),
            "Identity updated"
        );

        Ok(())
    }

    async fn reset_password(
        &self,
        id: i64,
        password: Option<Password>,
    ) -> Result<String, IdentityError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        let password = match password {
            Some(password) => password.as_str().to_string(),
            None => generate_password(),
        };

        let secrets = self.generate_secrets(&password).await?;
        self.repository.reset_secrets(id, secrets).await?;

        tracing::info!(identity_id = id, "Password reset and keys regenerated");

        Ok(password)
    }
}

fn ensure_unique_grants(grants: &[ServiceGrant]) -> Result<(), IdentityError> {
    let mut names = HashSet::new();
    let mut identifiers = HashSet::new();

    for grant in grants {
        if !names.insert(grant.name.as_str()) || !identifiers.insert(grant.identifier) {
            return Err(IdentityError::DuplicateServiceGrant(grant.name.clone()));
        }

        let mut permissions = HashSet::new();
        for permission in &grant.permissions {
            if !permissions.insert(permission.name.as_str()) {
                return Err(IdentityError::DuplicatePermissionGrant {
                    service: grant.name.clone(),
                    permission: permission.name.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Random alphanumeric password that also passes the strength policy.
fn generate_password() -> String {
    let mut rng = rand::thread_rng();

    loop {
        let candidate: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(GENERATED_PASSWORD_LENGTH)
            .map(char::from)
            .collect();

        if Password::new(candidate.clone()).is_ok() {
            return candidate;
        }
    }
}
