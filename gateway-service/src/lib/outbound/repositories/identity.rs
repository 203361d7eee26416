use std::collections::HashMap;

use async_trait::async_trait;
use auth::PasswordHasher;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::errors::IdentityError;
use crate::identity::models::Identity;
use crate::identity::models::IdentityRef;
use crate::identity::models::IdentitySecrets;
use crate::identity::models::NewIdentity;
use crate::identity::models::PermissionGrant;
use crate::identity::models::SecretsRecord;
use crate::identity::models::ServiceGrant;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::SecretsStore;

#[derive(Debug, FromRow)]
struct IdentityRow {
    id: i64,
    identifier: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    active: bool,
    token_lifetime_hours: i32,
}

#[derive(Debug, FromRow)]
struct ServiceGrantRow {
    identifier: Uuid,
    name: String,
    has_access: bool,
}

#[derive(Debug, FromRow)]
struct PermissionGrantRow {
    service_identifier: Uuid,
    name: String,
    has_access: bool,
}

#[derive(FromRow)]
struct CredentialRow {
    id: i64,
    password_hash: String,
    public_key: String,
    private_key: String,
    active: bool,
}

#[derive(FromRow)]
struct KeyStatusRow {
    id: i64,
    public_key: String,
    active: bool,
}

impl IdentityRow {
    fn into_identity(self, service_grants: Vec<ServiceGrant>) -> Identity {
        Identity {
            id: self.id,
            identifier: self.identifier,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            active: self.active,
            token_lifetime_hours: self.token_lifetime_hours,
            service_grants,
            permissions: None,
        }
    }
}

/// PostgreSQL-backed identity store.
///
/// Serves both the management operations and the credential lookups made on
/// every verification.
pub struct PostgresIdentityRepository {
    pool: PgPool,
    password_hasher: PasswordHasher,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            password_hasher: PasswordHasher::new(),
        }
    }

    async fn load_grants(&self, user_id: i64) -> Result<Vec<ServiceGrant>, IdentityError> {
        let services = sqlx::query_as::<_, ServiceGrantRow>(
            r#"
            SELECT s.identifier, s.name, a.has_access
            FROM user_service_access a
            JOIN services s ON s.id = a.service_id
            WHERE a.user_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        let permissions = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT s.identifier AS service_identifier, p.name, up.has_access
            FROM user_service_permissions up
            JOIN service_permissions p ON p.id = up.permission_id
            JOIN services s ON s.id = p.service_id
            WHERE up.user_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        let mut by_service: HashMap<Uuid, Vec<PermissionGrant>> = HashMap::new();
        for row in permissions {
            by_service
                .entry(row.service_identifier)
                .or_default()
                .push(PermissionGrant {
                    name: row.name,
                    has_access: row.has_access,
                });
        }

        Ok(services
            .into_iter()
            .map(|row| ServiceGrant {
                permissions: by_service.remove(&row.identifier).unwrap_or_default(),
                name: row.name,
                identifier: row.identifier,
                has_access: row.has_access,
            })
            .collect())
    }
}

fn map_write_error(e: sqlx::Error, email: &str) -> IdentityError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return IdentityError::EmailAlreadyExists(email.to_string());
        }
    }
    IdentityError::DatabaseError(e.to_string())
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn create(&self, identity: NewIdentity) -> Result<Identity, IdentityError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (
                identifier, first_name, last_name, email,
                password_hash, public_key, private_key, token_lifetime_hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(identity.identifier)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.email)
        .bind(&identity.secrets.password_hash)
        .bind(&identity.secrets.public_key)
        .bind(&identity.secrets.private_key)
        .bind(identity.token_lifetime_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &identity.email))?;

        Ok(Identity {
            id,
            identifier: identity.identifier,
            first_name: identity.first_name,
            last_name: identity.last_name,
            email: identity.email,
            active: true,
            token_lifetime_hours: identity.token_lifetime_hours,
            service_grants: Vec::new(),
            permissions: None,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, identifier, first_name, last_name, email, active, token_lifetime_hours
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => {
                let grants = self.load_grants(row.id).await?;
                Ok(Some(row.into_identity(grants)))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, identity: &Identity, granted_by: i64) -> Result<(), IdentityError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, active = $5,
                token_lifetime_hours = $6, updated_at = NOW(), updated_by = $7
            WHERE id = $1
            "#,
        )
        .bind(identity.id)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.email)
        .bind(identity.active)
        .bind(identity.token_lifetime_hours)
        .bind(granted_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &identity.email))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(identity.id.to_string()));
        }

        sqlx::query("DELETE FROM user_service_permissions WHERE user_id = $1")
            .bind(identity.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        sqlx::query("DELETE FROM user_service_access WHERE user_id = $1")
            .bind(identity.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        for grant in &identity.service_grants {
            let inserted = sqlx::query(
                r#"
                INSERT INTO user_service_access (user_id, service_id, has_access, granted_by)
                SELECT $1, id, $3, $4
                FROM services
                WHERE identifier = $2
                "#,
            )
            .bind(identity.id)
            .bind(grant.identifier)
            .bind(grant.has_access)
            .bind(granted_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

            if inserted.rows_affected() == 0 {
                return Err(IdentityError::UnknownService(grant.name.clone()));
            }

            for permission in &grant.permissions {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO user_service_permissions
                        (user_id, permission_id, has_access, granted_by)
                    SELECT $1, p.id, $4, $5
                    FROM service_permissions p
                    JOIN services s ON s.id = p.service_id
                    WHERE s.identifier = $2 AND p.name = $3
                    "#,
                )
                .bind(identity.id)
                .bind(grant.identifier)
                .bind(&permission.name)
                .bind(permission.has_access)
                .bind(granted_by)
                .execute(&mut *tx)
                .await
                .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

                if inserted.rows_affected() == 0 {
                    return Err(IdentityError::UnknownPermission {
                        service: grant.name.clone(),
                        permission: permission.name.clone(),
                    });
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))
    }

    async fn reset_secrets(&self, id: i64, secrets: IdentitySecrets) -> Result<(), IdentityError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, public_key = $3, private_key = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&secrets.password_hash)
        .bind(&secrets.public_key)
        .bind(&secrets.private_key)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl SecretsStore for PostgresIdentityRepository {
    async fn get_keys_and_status(
        &self,
        identity: &IdentityRef,
    ) -> Result<Option<SecretsRecord>, IdentityError> {
        let row = sqlx::query_as::<_, KeyStatusRow>(
            r#"
            SELECT id, public_key, active
            FROM users
            WHERE id = $1 AND identifier = $2 AND email = $3
            "#,
        )
        .bind(identity.id)
        .bind(identity.identifier)
        .bind(&identity.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| SecretsRecord {
            id: r.id,
            password_hash: None,
            public_key: r.public_key,
            private_key: None,
            active: r.active,
        }))
    }

    async fn validate_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<SecretsRecord>, IdentityError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, password_hash, public_key, private_key, active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        if !row.active {
            tracing::debug!(identity_id = row.id, "Login refused for inactive identity");
            return Ok(None);
        }

        if !self.password_hasher.verify(password, &row.password_hash)? {
            return Ok(None);
        }

        Ok(Some(SecretsRecord {
            id: row.id,
            password_hash: Some(row.password_hash),
            public_key: row.public_key,
            private_key: Some(row.private_key),
            active: row.active,
        }))
    }
}
