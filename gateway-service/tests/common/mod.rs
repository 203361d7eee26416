#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use async_trait::async_trait;
use auth::Clock;
use auth::KeyCodec;
use auth::PasswordHasher;
use auth::RsaKeyPair;
use auth::SystemClock;
use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::Json;
use axum::Router;
use futures::StreamExt;
use gateway_service::authorization::AuthorizationEngine;
use gateway_service::catalog::errors::CatalogError;
use gateway_service::catalog::models::NewService;
use gateway_service::catalog::models::ServiceEndpoint;
use gateway_service::catalog::models::ServiceRecord;
use gateway_service::catalog::models::UpdateServiceCommand;
use gateway_service::catalog::ports::ServiceRegistry;
use gateway_service::catalog::ports::ServiceRepository;
use gateway_service::catalog::ServiceCatalog;
use gateway_service::config::ProxyConfig;
use gateway_service::identity::errors::IdentityError;
use gateway_service::identity::models::Identity;
use gateway_service::identity::models::IdentityRef;
use gateway_service::identity::models::IdentitySecrets;
use gateway_service::identity::models::NewIdentity;
use gateway_service::identity::models::PermissionGrant;
use gateway_service::identity::models::SecretsRecord;
use gateway_service::identity::models::ServiceGrant;
use gateway_service::identity::ports::IdentityRepository;
use gateway_service::identity::ports::SecretsStore;
use gateway_service::identity::IdentityService;
use gateway_service::inbound::http::router::create_router;
use gateway_service::inbound::http::router::AppState;
use gateway_service::outbound::upstream::UpstreamClient;
use gateway_service::proxy::ProxyGateway;
use serde_json::json;
use tokio::sync::Notify;
use uuid::Uuid;

pub const ISSUER: &str = "identity-gateway";
pub const GATEWAY_SERVICE: &str = "identity-gateway";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Adm1nPassword";

/// Keypair shared by every seeded identity and service.
pub fn shared_keypair() -> &'static RsaKeyPair {
    static KEYS: OnceLock<RsaKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| RsaKeyPair::generate().expect("Failed to generate keypair"))
}

struct StoredIdentity {
    identity: Identity,
    secrets: IdentitySecrets,
}

/// In-memory stand-in for the identity and service tables.
#[derive(Default)]
pub struct InMemoryDirectory {
    identities: Mutex<Vec<StoredIdentity>>,
    services: Mutex<Vec<ServiceRecord>>,
    hasher: PasswordHasher,
}

impl InMemoryDirectory {
    /// Store an identity directly, bypassing key generation.
    pub fn seed_identity(
        &self,
        email: &str,
        password: &str,
        grants: Vec<ServiceGrant>,
    ) -> Identity {
        let keys = shared_keypair();
        let mut identities = self.identities.lock().unwrap();
        let identity = Identity {
            id: identities.len() as i64 + 1,
            identifier: Uuid::new_v4(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            active: true,
            token_lifetime_hours: 8,
            service_grants: grants,
            permissions: None,
        };
        identities.push(StoredIdentity {
            identity: identity.clone(),
            secrets: IdentitySecrets {
                password_hash: self.hasher.hash(password).unwrap(),
                public_key: KeyCodec::encode(&keys.public),
                private_key: KeyCodec::encode(&keys.private),
            },
        });
        identity
    }

    pub fn seed_service(&self, name: &str, host: &str, port: u16, permissions: &[&str]) -> Uuid {
        let keys = shared_keypair();
        let mut services = self.services.lock().unwrap();
        let identifier = Uuid::new_v4();
        let next_id = services.len() as i64 + 1;
        services.push(ServiceRecord {
            id: next_id,
            identifier,
            name: name.to_string(),
            description: String::new(),
            host: host.to_string(),
            port,
            active: true,
            public_key: KeyCodec::encode(&keys.public),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        });
        identifier
    }

    pub fn set_service_active(&self, name: &str, active: bool) {
        let mut services = self.services.lock().unwrap();
        if let Some(service) = services.iter_mut().find(|s| s.name == name) {
            service.active = active;
        }
    }

    pub fn set_identity_active(&self, id: i64, active: bool) {
        let mut identities = self.identities.lock().unwrap();
        if let Some(stored) = identities.iter_mut().find(|s| s.identity.id == id) {
            stored.identity.active = active;
        }
    }

    pub fn service_identifier(&self, name: &str) -> Option<Uuid> {
        let services = self.services.lock().unwrap();
        services.iter().find(|s| s.name == name).map(|s| s.identifier)
    }
}

#[async_trait]
impl IdentityRepository for InMemoryDirectory {
    async fn create(&self, identity: NewIdentity) -> Result<Identity, IdentityError> {
        let mut identities = self.identities.lock().unwrap();
        if identities.iter().any(|s| s.identity.email == identity.email) {
            return Err(IdentityError::EmailAlreadyExists(identity.email));
        }

        let created = Identity {
            id: identities.len() as i64 + 1,
            identifier: identity.identifier,
            first_name: identity.first_name,
            last_name: identity.last_name,
            email: identity.email,
            active: true,
            token_lifetime_hours: identity.token_lifetime_hours,
            service_grants: Vec::new(),
            permissions: None,
        };
        identities.push(StoredIdentity {
            identity: created.clone(),
            secrets: identity.secrets,
        });
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, IdentityError> {
        let identities = self.identities.lock().unwrap();
        Ok(identities
            .iter()
            .find(|s| s.identity.id == id)
            .map(|s| s.identity.clone()))
    }

    async fn update(&self, identity: &Identity, _granted_by: i64) -> Result<(), IdentityError> {
        {
            let services = self.services.lock().unwrap();
            for grant in &identity.service_grants {
                let service = services
                    .iter()
                    .find(|s| s.identifier == grant.identifier)
                    .ok_or_else(|| IdentityError::UnknownService(grant.name.clone()))?;
                for permission in &grant.permissions {
                    if !service.permissions.contains(&permission.name) {
                        return Err(IdentityError::UnknownPermission {
                            service: grant.name.clone(),
                            permission: permission.name.clone(),
                        });
                    }
                }
            }
        }

        let mut identities = self.identities.lock().unwrap();
        if identities
            .iter()
            .any(|s| s.identity.email == identity.email && s.identity.id != identity.id)
        {
            return Err(IdentityError::EmailAlreadyExists(identity.email.clone()));
        }

        let stored = identities
            .iter_mut()
            .find(|s| s.identity.id == identity.id)
            .ok_or_else(|| IdentityError::NotFound(identity.id.to_string()))?;
        stored.identity = identity.clone();
        Ok(())
    }

    async fn reset_secrets(&self, id: i64, secrets: IdentitySecrets) -> Result<(), IdentityError> {
        let mut identities = self.identities.lock().unwrap();
        let stored = identities
            .iter_mut()
            .find(|s| s.identity.id == id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        stored.secrets = secrets;
        Ok(())
    }
}

#[async_trait]
impl SecretsStore for InMemoryDirectory {
    async fn get_keys_and_status(
        &self,
        identity: &IdentityRef,
    ) -> Result<Option<SecretsRecord>, IdentityError> {
        let identities = self.identities.lock().unwrap();
        Ok(identities
            .iter()
            .find(|s| {
                s.identity.id == identity.id
                    && s.identity.identifier == identity.identifier
                    && s.identity.email == identity.email
            })
            .map(|s| SecretsRecord {
                id: s.identity.id,
                password_hash: None,
                public_key: s.secrets.public_key.clone(),
                private_key: None,
                active: s.identity.active,
            }))
    }

    async fn validate_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<SecretsRecord>, IdentityError> {
        let stored = {
            let identities = self.identities.lock().unwrap();
            identities
                .iter()
                .find(|s| s.identity.email == email && s.identity.active)
                .map(|s| (s.identity.id, s.secrets.clone()))
        };

        let Some((id, secrets)) = stored else {
            return Ok(None);
        };
        if !self.hasher.verify(password, &secrets.password_hash)? {
            return Ok(None);
        }

        Ok(Some(SecretsRecord {
            id,
            password_hash: Some(secrets.password_hash),
            public_key: secrets.public_key,
            private_key: Some(secrets.private_key),
            active: true,
        }))
    }
}

#[async_trait]
impl ServiceRepository for InMemoryDirectory {
    async fn list_all(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        Ok(self.services.lock().unwrap().clone())
    }

    async fn create(&self, service: NewService) -> Result<ServiceRecord, CatalogError> {
        let mut services = self.services.lock().unwrap();
        if services.iter().any(|s| s.name == service.name) {
            return Err(CatalogError::NameAlreadyExists(service.name));
        }

        let record = ServiceRecord {
            id: services.len() as i64 + 1,
            identifier: service.identifier,
            name: service.name,
            description: service.description,
            host: service.host,
            port: service.port,
            active: true,
            public_key: service.public_key,
            permissions: service.permissions,
        };
        services.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        identifier: Uuid,
        command: &UpdateServiceCommand,
    ) -> Result<(), CatalogError> {
        let mut services = self.services.lock().unwrap();
        let service = services
            .iter_mut()
            .find(|s| s.identifier == identifier)
            .ok_or_else(|| CatalogError::NotFound(identifier.to_string()))?;
        service.description = command.description.clone();
        service.host = command.host.as_str().to_string();
        service.port = command.port.get();
        service.active = command.active;
        Ok(())
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryDirectory {
    async fn get_by_name(&self, name: &str) -> Result<Option<ServiceEndpoint>, CatalogError> {
        let services = self.services.lock().unwrap();
        Ok(services
            .iter()
            .find(|s| s.name == name)
            .map(ServiceEndpoint::from))
    }
}

pub fn grant(name: &str, identifier: Uuid, permissions: &[(&str, bool)]) -> ServiceGrant {
    ServiceGrant {
        name: name.to_string(),
        identifier,
        has_access: true,
        permissions: permissions
            .iter()
            .map(|(name, has_access)| PermissionGrant {
                name: name.to_string(),
                has_access: *has_access,
            })
            .collect(),
    }
}

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub directory: Arc<InMemoryDirectory>,
    pub api_client: reqwest::Client,
    pub admin: Identity,
}

impl TestApp {
    /// Spawn the gateway in a background task with an administrator seeded.
    ///
    /// The administrator holds every management permission on the gateway.
    pub async fn spawn() -> Self {
        let directory = Arc::new(InMemoryDirectory::default());

        let gateway_id = directory.seed_service(
            GATEWAY_SERVICE,
            "127.0.0.1",
            1,
            &[
                "read-user",
                "update-user",
                "reset-password",
                "read-all-service",
                "create-service",
                "update-service",
            ],
        );
        let admin = directory.seed_identity(
            ADMIN_EMAIL,
            ADMIN_PASSWORD,
            vec![grant(
                GATEWAY_SERVICE,
                gateway_id,
                &[
                    ("read-user", true),
                    ("update-user", true),
                    ("reset-password", true),
                    ("read-all-service", true),
                    ("create-service", true),
                    ("update-service", true),
                ],
            )],
        );

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let identity_service = Arc::new(IdentityService::new(
            Arc::clone(&directory),
            Arc::clone(&directory),
            Arc::clone(&clock),
            ISSUER,
        ));
        let catalog = Arc::new(ServiceCatalog::new(Arc::clone(&directory)));
        let authorizer = Arc::new(AuthorizationEngine::new(
            Arc::clone(&directory),
            clock,
            ISSUER,
            GATEWAY_SERVICE,
        ));

        let proxy_config = ProxyConfig::default();
        let state = AppState {
            identity_service,
            catalog,
            authorizer: authorizer.clone(),
            gateway: ProxyGateway::new(directory.clone(), authorizer),
            upstream: UpstreamClient::new(&proxy_config).expect("Failed to build upstream client"),
            service_header: HeaderName::from_static("service"),
        };

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let router = create_router(state);
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            directory,
            api_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            admin,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.put(path).bearer_auth(token)
    }

    /// Log in and return the issued token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Token missing")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }
}

/// Backend that reports what it received.
///
/// `/redirect` answers 302 and `/status/teapot` answers 418 with a custom
/// header; any other path echoes method, path, query, headers and body.
pub async fn spawn_backend() -> u16 {
    let router = Router::new()
        .route("/redirect", get(redirect))
        .route("/status/teapot", get(teapot))
        .fallback(echo);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind backend port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Backend error");
    });

    port
}

async fn redirect() -> Response {
    (StatusCode::FOUND, [("location", "/elsewhere")]).into_response()
}

async fn teapot() -> Response {
    (StatusCode::IM_A_TEAPOT, [("x-backend", "teapot")], "short and stout").into_response()
}

async fn echo(request: Request) -> Json<serde_json::Value> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": header_map(&parts.headers),
        "body": String::from_utf8_lossy(&body),
    }))
}

fn header_map(headers: &HeaderMap) -> serde_json::Map<String, serde_json::Value> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                json!(value.to_str().unwrap_or_default()),
            )
        })
        .collect()
}

pub const STREAM_CHUNKS: usize = 50;

/// Signals shared with a backend whose responses the test paces.
#[derive(Clone, Default)]
pub struct StreamControl {
    /// Lets `/gated` send its second chunk.
    pub release: Arc<Notify>,
    /// Fired once `/hang` has received the call.
    pub entered: Arc<Notify>,
    /// Fired when the `/hang` handler is dropped.
    pub dropped: Arc<Notify>,
}

/// Spawn a backend with chunked, gated and never-ending responses.
pub async fn spawn_streaming_backend() -> (u16, StreamControl) {
    let control = StreamControl::default();
    let router = Router::new()
        .route("/chunks", get(chunks))
        .route("/gated", get(gated))
        .route("/hang", get(hang))
        .with_state(control.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind backend port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Backend error");
    });

    (port, control)
}

pub fn chunk(index: usize) -> String {
    format!("chunk-{}\n", index)
}

async fn chunks() -> Response {
    let stream = futures::stream::iter((0..STREAM_CHUNKS).map(|i| Ok::<_, Infallible>(chunk(i))));
    Body::from_stream(stream).into_response()
}

async fn gated(State(control): State<StreamControl>) -> Response {
    let first = futures::stream::once(async { Ok::<_, Infallible>("first\n") });
    let second = futures::stream::once(async move {
        control.release.notified().await;
        Ok::<_, Infallible>("second\n")
    });

    Body::from_stream(first.chain(second)).into_response()
}

struct DropSignal(Arc<Notify>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

async fn hang(State(control): State<StreamControl>) -> Response {
    let _signal = DropSignal(Arc::clone(&control.dropped));
    control.entered.notify_one();
    std::future::pending::<Response>().await
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    listener.local_addr().unwrap().port()
}
