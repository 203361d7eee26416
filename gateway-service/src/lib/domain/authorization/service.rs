use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;
use auth::KeyCodec;
use auth::TokenService;

use crate::authorization::models::Authorization;
use crate::authorization::ports::AuthorizerPort;
use crate::identity::models::Identity;
use crate::identity::ports::SecretsStore;

const BEARER_PREFIX: &str = "Bearer ";
const MIN_TOKEN_LENGTH: usize = 10;

/// Turns a bearer credential into a verified, permission-checked identity.
///
/// Checks run in a fixed order and stop at the first failure:
/// header shape, token structure, embedded subject, fresh secrets lookup
/// (must exist and be active), expiration, issuer, signature, then grants.
/// Expiration and issuer are read from the still unverified payload; the
/// signature check that follows covers both.
pub struct AuthorizationEngine<SS>
where
    SS: SecretsStore,
{
    secrets: Arc<SS>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
    issuer: String,
    service_name: String,
}

impl<SS> AuthorizationEngine<SS>
where
    SS: SecretsStore,
{
    /// Create a new engine.
    ///
    /// # Arguments
    /// * `secrets` - Store consulted on every check
    /// * `clock` - Time source for expiration
    /// * `issuer` - Required `iss` claim
    /// * `service_name` - Grant name guarding this deployment's own API
    pub fn new(
        secrets: Arc<SS>,
        clock: Arc<dyn Clock>,
        issuer: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            secrets,
            tokens: TokenService::new(Arc::clone(&clock)),
            clock,
            issuer: issuer.into(),
            service_name: service_name.into(),
        }
    }

    /// Every failure, store errors included, rejects as `Unauthenticated`.
    async fn verify(&self, authorization: Option<&str>) -> Result<Identity, Authorization> {
        let token = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .filter(|token| token.len() >= MIN_TOKEN_LENGTH)
            .ok_or_else(|| {
                tracing::debug!("Missing or malformed bearer credential");
                Authorization::Unauthenticated
            })?;

        let parsed = self.tokens.parse::<Identity>(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            Authorization::Unauthenticated
        })?;

        let identity = &parsed.claims.payload;
        if !identity.has_subject() {
            tracing::debug!(identity_id = identity.id, "Token subject incomplete");
            return Err(Authorization::Unauthenticated);
        }

        let record = self
            .secrets
            .get_keys_and_status(&identity.reference())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, identity_id = identity.id, "Secrets lookup failed");
                Authorization::Unauthenticated
            })?
            .ok_or_else(|| {
                tracing::debug!(identity_id = identity.id, "No secrets for token subject");
                Authorization::Unauthenticated
            })?;

        if !record.active {
            tracing::debug!(identity_id = identity.id, "Identity inactive");
            return Err(Authorization::Unauthenticated);
        }

        if parsed.claims.is_expired_at(self.clock.now()) {
            tracing::debug!(
                identity_id = identity.id,
                exp = parsed.claims.exp,
                "Token expired"
            );
            return Err(Authorization::Unauthenticated);
        }

        if !parsed.claims.is_issued_by(&self.issuer) {
            tracing::warn!(
                identity_id = identity.id,
                issuer = %parsed.claims.iss,
                "Token issuer mismatch"
            );
            return Err(Authorization::Unauthenticated);
        }

        let public_key = KeyCodec::decode(&record.public_key).map_err(|e| {
            tracing::warn!(error = %e, identity_id = identity.id, "Stored public key unusable");
            Authorization::Unauthenticated
        })?;

        if !self.tokens.verify_signature(&parsed, &public_key) {
            tracing::warn!(identity_id = identity.id, "Token signature invalid");
            return Err(Authorization::Unauthenticated);
        }

        Ok(parsed.claims.payload)
    }
}

#[async_trait]
impl<SS> AuthorizerPort for AuthorizationEngine<SS>
where
    SS: SecretsStore,
{
    async fn authorize(
        &self,
        authorization: Option<&str>,
        permission: Option<&str>,
    ) -> Authorization {
        let identity = match self.verify(authorization).await {
            Ok(identity) => identity,
            Err(rejection) => return rejection,
        };

        let has_access = identity
            .grant_for(&self.service_name)
            .is_some_and(|grant| grant.has_access);

        if !has_access {
            tracing::debug!(
                identity_id = identity.id,
                service = %self.service_name,
                "No access to service"
            );
            return Authorization::Forbidden(identity);
        }

        if let Some(permission) = permission {
            let granted = identity
                .grant_for(&self.service_name)
                .and_then(|grant| grant.permission(permission))
                .is_some_and(|permission| permission.has_access);

            if !granted {
                tracing::debug!(
                    identity_id = identity.id,
                    permission = permission,
                    "Permission not granted"
                );
                return Authorization::Forbidden(identity);
            }
        }

        Authorization::Authorized(identity)
    }

    async fn authorize_for_proxy(
        &self,
        authorization: Option<&str>,
        service_name: &str,
    ) -> Authorization {
        let identity = match self.verify(authorization).await {
            Ok(identity) => identity,
            Err(rejection) => return rejection,
        };

        let has_access = identity
            .grant_for(service_name)
            .is_some_and(|grant| grant.has_access);

        if !has_access {
            tracing::debug!(
                identity_id = identity.id,
                service = service_name,
                "No access to proxied service"
            );
            return Authorization::Forbidden(identity);
        }

        Authorization::Authorized(identity.scoped_to(service_name))
    }
}
