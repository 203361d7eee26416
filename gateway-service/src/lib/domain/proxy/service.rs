use std::sync::Arc;

use crate::authorization::models::Authorization;
use crate::authorization::ports::AuthorizerPort;
use crate::catalog::ports::ServiceRegistry;
use crate::proxy::errors::ProxyError;
use crate::proxy::models::ProxyAdmission;

/// Admission control for proxied requests.
///
/// Resolves the target backend, refuses inactive ones, then authorizes the
/// caller for that backend. The secrets store is only consulted once the
/// backend is known to exist and be active.
#[derive(Clone)]
pub struct ProxyGateway {
    registry: Arc<dyn ServiceRegistry>,
    authorizer: Arc<dyn AuthorizerPort>,
}

impl ProxyGateway {
    pub fn new(registry: Arc<dyn ServiceRegistry>, authorizer: Arc<dyn AuthorizerPort>) -> Self {
        Self {
            registry,
            authorizer,
        }
    }

    /// Decide whether a request may be forwarded.
    ///
    /// # Arguments
    /// * `service_name` - Value of the service selection header, if any
    /// * `authorization` - Raw `Authorization` header value, if any
    ///
    /// # Returns
    /// Target endpoint and the identity scoped to it
    ///
    /// # Errors
    /// * `ServiceNotFound` - No selection header or no such service
    /// * `ServiceUnavailable` - Service is registered but inactive
    /// * `Unauthenticated` - Credential missing or invalid
    /// * `Forbidden` - Caller has no access to the service
    /// * `Internal` - Registry or secrets store failed
    pub async fn admit(
        &self,
        service_name: Option<&str>,
        authorization: Option<&str>,
    ) -> Result<ProxyAdmission, ProxyError> {
        let service_name = service_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ProxyError::ServiceNotFound("<none>".to_string()))?;

        let endpoint = self
            .registry
            .get_by_name(service_name)
            .await
            .map_err(|e| ProxyError::Internal(e.to_string()))?
            .ok_or_else(|| ProxyError::ServiceNotFound(service_name.to_string()))?;

        if !endpoint.active {
            return Err(ProxyError::ServiceUnavailable(endpoint.name));
        }

        match self
            .authorizer
            .authorize_for_proxy(authorization, &endpoint.name)
            .await
        {
            Authorization::Authorized(identity) => Ok(ProxyAdmission { endpoint, identity }),
            Authorization::Forbidden(identity) => {
                tracing::info!(
                    identity_id = identity.id,
                    service = %endpoint.name,
                    "Proxy access forbidden"
                );
                Err(ProxyError::Forbidden(endpoint.name))
            }
            Authorization::Unauthenticated => Err(ProxyError::Unauthenticated),
            Authorization::SystemError => Err(ProxyError::Internal(format!(
                "Authorization failed for service {}",
                endpoint.name
            ))),
        }
    }
}
