use std::sync::Arc;

use auth::Clock;
use auth::SystemClock;
use axum::http::HeaderName;
use gateway_service::authorization::AuthorizationEngine;
use gateway_service::catalog::ServiceCatalog;
use gateway_service::config::Config;
use gateway_service::identity::IdentityService;
use gateway_service::inbound::http::router::create_router;
use gateway_service::inbound::http::router::AppState;
use gateway_service::outbound::repositories::PostgresIdentityRepository;
use gateway_service::outbound::repositories::PostgresServiceRepository;
use gateway_service::outbound::upstream::UpstreamClient;
use gateway_service::proxy::ProxyGateway;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "gateway-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        issuer = %config.auth.issuer,
        service_name = %config.auth.service_name,
        proxy_scheme = %config.proxy.scheme,
        service_header = %config.proxy.service_header,
        identity_header = %config.proxy.identity_header,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let identity_repository = Arc::new(PostgresIdentityRepository::new(pg_pool.clone()));
    let service_repository = Arc::new(PostgresServiceRepository::new(pg_pool));

    let identity_service = Arc::new(IdentityService::new(
        Arc::clone(&identity_repository),
        Arc::clone(&identity_repository),
        Arc::clone(&clock),
        config.auth.issuer.clone(),
    ));
    let catalog = Arc::new(ServiceCatalog::new(Arc::clone(&service_repository)));
    let authorizer = Arc::new(AuthorizationEngine::new(
        identity_repository,
        clock,
        config.auth.issuer.clone(),
        config.auth.service_name.clone(),
    ));

    let gateway = ProxyGateway::new(service_repository, authorizer.clone());
    let upstream = UpstreamClient::new(&config.proxy)?;
    let service_header = HeaderName::from_bytes(config.proxy.service_header.as_bytes())?;

    let state = AppState {
        identity_service,
        catalog,
        authorizer,
        gateway,
        upstream,
        service_header,
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited, in-flight requests drained");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
