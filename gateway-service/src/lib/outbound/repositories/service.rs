use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::errors::CatalogError;
use crate::catalog::models::NewService;
use crate::catalog::models::ServiceEndpoint;
use crate::catalog::models::ServiceRecord;
use crate::catalog::models::UpdateServiceCommand;
use crate::catalog::ports::ServiceRegistry;
use crate::catalog::ports::ServiceRepository;

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: i64,
    identifier: Uuid,
    name: String,
    description: String,
    host: String,
    port: i32,
    active: bool,
    public_key: String,
    permissions: Vec<String>,
}

#[derive(Debug, FromRow)]
struct EndpointRow {
    name: String,
    host: String,
    port: i32,
    active: bool,
}

fn stored_port(port: i32) -> Result<u16, CatalogError> {
    u16::try_from(port)
        .map_err(|_| CatalogError::DatabaseError(format!("Stored port out of range: {}", port)))
}

impl TryFrom<ServiceRow> for ServiceRecord {
    type Error = CatalogError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(ServiceRecord {
            id: row.id,
            identifier: row.identifier,
            name: row.name,
            description: row.description,
            host: row.host,
            port: stored_port(row.port)?,
            active: row.active,
            public_key: row.public_key,
            permissions: row.permissions,
        })
    }
}

pub struct PostgresServiceRepository {
    pool: PgPool,
}

impl PostgresServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepository {
    async fn list_all(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT s.id, s.identifier, s.name, s.description, s.host, s.port, s.active,
                   s.public_key,
                   COALESCE(
                       array_agg(p.name::TEXT ORDER BY p.name) FILTER (WHERE p.name IS NOT NULL),
                       '{}'::TEXT[]
                   ) AS permissions
            FROM services s
            LEFT JOIN service_permissions p ON p.service_id = s.id
            GROUP BY s.id
            ORDER BY s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(ServiceRecord::try_from).collect()
    }

    async fn create(&self, service: NewService) -> Result<ServiceRecord, CatalogError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO services (identifier, name, description, host, port, public_key, private_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(service.identifier)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.host)
        .bind(i32::from(service.port))
        .bind(&service.public_key)
        .bind(&service.private_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("services_name_key")
                {
                    return CatalogError::NameAlreadyExists(service.name.clone());
                }
            }
            CatalogError::DatabaseError(e.to_string())
        })?;

        for permission in &service.permissions {
            sqlx::query("INSERT INTO service_permissions (service_id, name) VALUES ($1, $2)")
                .bind(id)
                .bind(permission)
                .execute(&mut *tx)
                .await
                .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        Ok(ServiceRecord {
            id,
            identifier: service.identifier,
            name: service.name,
            description: service.description,
            host: service.host,
            port: service.port,
            active: true,
            public_key: service.public_key,
            permissions: service.permissions,
        })
    }

    async fn update(
        &self,
        identifier: Uuid,
        command: &UpdateServiceCommand,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET description = $2, host = $3, port = $4, active = $5, updated_at = NOW()
            WHERE identifier = $1
            "#,
        )
        .bind(identifier)
        .bind(&command.description)
        .bind(command.host.as_str())
        .bind(i32::from(command.port.get()))
        .bind(command.active)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(identifier.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl ServiceRegistry for PostgresServiceRepository {
    async fn get_by_name(&self, name: &str) -> Result<Option<ServiceEndpoint>, CatalogError> {
        let row = sqlx::query_as::<_, EndpointRow>(
            r#"
            SELECT name, host, port, active
            FROM services
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(ServiceEndpoint {
                port: stored_port(r.port)?,
                name: r.name,
                host: r.host,
                active: r.active,
            })),
            None => Ok(None),
        }
    }
}
