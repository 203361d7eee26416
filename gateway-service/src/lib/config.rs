use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Token issuance and verification settings.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// `iss` claim written at login and required on every presented token.
    pub issuer: String,
    /// Grant name that unlocks this deployment's own API.
    pub service_name: String,
}

/// Reverse proxy settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Scheme used to reach backends, `http` or `https`.
    pub scheme: String,
    /// Request header naming the target backend.
    pub service_header: String,
    /// Header injected into forwarded requests with the scoped identity.
    pub identity_header: String,
    pub timeout_seconds: u64,
    pub pool_idle_timeout_seconds: u64,
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_seconds)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            service_header: "service".to_string(),
            identity_header: "x-identity".to_string(),
            timeout_seconds: 100,
            pool_idle_timeout_seconds: 90,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, AUTH__ISSUER, PROXY__SCHEME, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: PROXY__IDENTITY_HEADER=x-user overrides proxy.identity_header
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
