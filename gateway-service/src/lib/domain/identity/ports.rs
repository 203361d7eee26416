use async_trait::async_trait;

use crate::identity::errors::IdentityError;
use crate::identity::models::CreateIdentityCommand;
use crate::identity::models::Identity;
use crate::identity::models::IdentityRef;
use crate::identity::models::IdentitySecrets;
use crate::identity::models::NewIdentity;
use crate::identity::models::Password;
use crate::identity::models::SecretsRecord;
use crate::identity::models::UpdateIdentityCommand;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Exchange credentials for a signed token.
    ///
    /// # Arguments
    /// * `email` - Account email
    /// * `password` - Plaintext password
    ///
    /// # Returns
    /// RS512 token carrying the identity and all its grants
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, inactive account or wrong password
    /// * `CredentialError` - Stored key material is unusable
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Register a new identity with a fresh keypair.
    ///
    /// # Returns
    /// Created identity, without grants
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `CredentialError` - Hashing or key generation failed
    /// * `DatabaseError` - Database operation failed
    async fn create_identity(&self, command: CreateIdentityCommand)
        -> Result<Identity, IdentityError>;

    /// Retrieve an identity with its grants.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_identity(&self, id: i64) -> Result<Identity, IdentityError>;

    /// Replace profile fields and grants.
    ///
    /// # Arguments
    /// * `id` - Identity to update
    /// * `command` - New profile and complete grant set
    /// * `granted_by` - Id of the identity performing the change
    ///
    /// # Errors
    /// * `DuplicateServiceGrant` - A service appears twice in the grant set
    /// * `DuplicatePermissionGrant` - A permission appears twice within a service
    /// * `NotFound` - Identity does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_identity(
        &self,
        id: i64,
        command: UpdateIdentityCommand,
        granted_by: i64,
    ) -> Result<(), IdentityError>;

    /// Set a new password and regenerate the identity's keypair.
    ///
    /// Every token issued before the reset stops verifying.
    ///
    /// # Arguments
    /// * `id` - Identity to reset
    /// * `password` - New password, or None to generate one
    ///
    /// # Returns
    /// The password now in effect
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `CredentialError` - Hashing or key generation failed
    /// * `DatabaseError` - Database operation failed
    async fn reset_password(
        &self,
        id: i64,
        password: Option<Password>,
    ) -> Result<String, IdentityError>;
}

/// Persistence operations for identities and their grants.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, identity: NewIdentity) -> Result<Identity, IdentityError>;

    /// Retrieve identity with its grants (None if not found).
    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, IdentityError>;

    /// Overwrite profile fields and the complete grant set.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, identity: &Identity, granted_by: i64) -> Result<(), IdentityError>;

    /// Replace password hash and keypair.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `DatabaseError` - Database operation failed
    async fn reset_secrets(&self, id: i64, secrets: IdentitySecrets) -> Result<(), IdentityError>;
}

/// Source of current credentials, read on every verification.
#[async_trait]
pub trait SecretsStore: Send + Sync + 'static {
    /// Fetch keys and active flag for the referenced identity.
    ///
    /// # Returns
    /// None when no identity matches id, identifier and email together
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn get_keys_and_status(
        &self,
        identity: &IdentityRef,
    ) -> Result<Option<SecretsRecord>, IdentityError>;

    /// Check a password for the given email.
    ///
    /// # Returns
    /// None when the email is unknown, the account is inactive or the password is wrong
    ///
    /// # Errors
    /// * `CredentialError` - Stored hash is unreadable
    /// * `DatabaseError` - Database operation failed
    async fn validate_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<SecretsRecord>, IdentityError>;
}
