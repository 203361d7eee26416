use std::fmt;

use uuid::Uuid;

use crate::catalog::errors::HostError;
use crate::catalog::errors::PortError;
use crate::catalog::errors::ServiceNameError;

/// A registered backend.
///
/// Only the public half of the service's keypair ever leaves the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub id: i64,
    pub identifier: Uuid,
    pub name: String,
    pub description: String,
    pub host: String,
    pub port: u16,
    pub active: bool,
    pub public_key: String,
    pub permissions: Vec<String>,
}

/// Routing view of a registered backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub active: bool,
}

impl From<&ServiceRecord> for ServiceEndpoint {
    fn from(record: &ServiceRecord) -> Self {
        Self {
            name: record.name.clone(),
            host: record.host.clone(),
            port: record.port,
            active: record.active,
        }
    }
}

/// Service name value type
///
/// 2-45 characters of letters, digits, space and `_ . , -`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceName(String);

impl ServiceName {
    const MIN_LENGTH: usize = 2;
    const MAX_LENGTH: usize = 45;

    pub fn new(name: String) -> Result<Self, ServiceNameError> {
        let length = name.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(ServiceNameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(ServiceNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | ',' | '-'))
        {
            return Err(ServiceNameError::InvalidCharacters);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Hostname or address a backend listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHost(String);

impl ServiceHost {
    pub fn new(host: String) -> Result<Self, HostError> {
        if host.trim().is_empty() {
            return Err(HostError::Empty);
        }
        if host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
        {
            return Err(HostError::InvalidCharacters(host));
        }
        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePort(u16);

impl ServicePort {
    pub fn new(port: i64) -> Result<Self, PortError> {
        u16::try_from(port)
            .ok()
            .filter(|port| *port > 0)
            .map(Self)
            .ok_or(PortError::OutOfRange(port))
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

/// Command to register a backend
#[derive(Debug)]
pub struct RegisterServiceCommand {
    pub name: ServiceName,
    pub description: String,
    pub host: ServiceHost,
    pub port: ServicePort,
    pub permissions: Vec<String>,
}

/// Command to change a backend's routing and status.
#[derive(Debug)]
pub struct UpdateServiceCommand {
    pub description: String,
    pub host: ServiceHost,
    pub port: ServicePort,
    pub active: bool,
}

/// Service ready to be persisted, with its encoded keypair.
#[derive(Clone)]
pub struct NewService {
    pub identifier: Uuid,
    pub name: String,
    pub description: String,
    pub host: String,
    pub port: u16,
    pub permissions: Vec<String>,
    pub public_key: String,
    pub private_key: String,
}
