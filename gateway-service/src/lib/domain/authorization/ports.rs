use async_trait::async_trait;

use crate::authorization::models::Authorization;

/// Port for bearer credential checks.
#[async_trait]
pub trait AuthorizerPort: Send + Sync + 'static {
    /// Check a credential against this deployment's own grant.
    ///
    /// # Arguments
    /// * `authorization` - Raw `Authorization` header value, if any
    /// * `permission` - Permission required on this deployment, if any
    async fn authorize(&self, authorization: Option<&str>, permission: Option<&str>)
        -> Authorization;

    /// Check a credential against a backend's grant.
    ///
    /// On success the identity is scoped to `service_name`: `permissions`
    /// holds the granted permission names and the grant set is dropped.
    async fn authorize_for_proxy(
        &self,
        authorization: Option<&str>,
        service_name: &str,
    ) -> Authorization;
}
