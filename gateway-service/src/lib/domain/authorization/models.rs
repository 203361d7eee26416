use crate::identity::models::Identity;

/// Outcome of checking a bearer credential.
///
/// `Forbidden` still carries the verified identity so callers can log who was
/// refused. `Unauthenticated` deliberately carries no reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Authorized(Identity),
    Forbidden(Identity),
    Unauthenticated,
    SystemError,
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }
}
