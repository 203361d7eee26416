use crate::catalog::models::ServiceEndpoint;
use crate::identity::models::Identity;

/// A request cleared to be forwarded: where to, and as whom.
///
/// `identity` is already scoped to `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAdmission {
    pub endpoint: ServiceEndpoint,
    pub identity: Identity,
}
