use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::errors::TokenLifetimeError;

/// Authenticated subject as embedded in a signed token.
///
/// At login the identity carries every service grant. After proxy scoping the
/// grant set is dropped and `permissions` lists what the caller may do on the
/// one target backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub identifier: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub token_lifetime_hours: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_grants: Vec<ServiceGrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Identity {
    /// Subject fields are present: positive id, non-nil identifier, an email.
    pub fn has_subject(&self) -> bool {
        self.id > 0 && !self.identifier.is_nil() && !self.email.trim().is_empty()
    }

    pub fn reference(&self) -> IdentityRef {
        IdentityRef {
            id: self.id,
            identifier: self.identifier,
            email: self.email.clone(),
        }
    }

    pub fn grant_for(&self, service_name: &str) -> Option<&ServiceGrant> {
        self.service_grants.iter().find(|g| g.name == service_name)
    }

    /// Narrow the identity to one backend's granted permission names.
    pub fn scoped_to(mut self, service_name: &str) -> Self {
        let permissions = self
            .grant_for(service_name)
            .map(ServiceGrant::granted_permissions)
            .unwrap_or_default();

        self.permissions = Some(permissions);
        self.service_grants.clear();
        self
    }
}

/// A subject's access to one service.
///
/// Presence of a grant means nothing by itself; only `has_access` does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGrant {
    pub name: String,
    pub identifier: Uuid,
    pub has_access: bool,
    #[serde(default)]
    pub permissions: Vec<PermissionGrant>,
}

impl ServiceGrant {
    pub fn permission(&self, name: &str) -> Option<&PermissionGrant> {
        self.permissions.iter().find(|p| p.name == name)
    }

    pub fn granted_permissions(&self) -> Vec<String> {
        self.permissions
            .iter()
            .filter(|p| p.has_access)
            .map(|p| p.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub name: String,
    pub has_access: bool,
}

/// Lookup key for a subject's secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRef {
    pub id: i64,
    pub identifier: Uuid,
    pub email: String,
}

/// Snapshot of a subject's credentials, fetched fresh for every verification.
///
/// Keys are in their stored text form.
#[derive(Clone)]
pub struct SecretsRecord {
    pub id: i64,
    pub password_hash: Option<String>,
    pub public_key: String,
    pub private_key: Option<String>,
    pub active: bool,
}

impl fmt::Debug for SecretsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsRecord")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First or last name: 2-96 letters and spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    const MIN_LENGTH: usize = 2;
    const MAX_LENGTH: usize = 96;

    /// Create a new valid name.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 2 characters
    /// * `TooLong` - More than 96 characters
    /// * `InvalidCharacters` - Anything but letters and spaces
    pub fn new(name: String) -> Result<Self, NameError> {
        let length = name.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(NameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !name.chars().all(|c| c.is_alphabetic() || c == ' ') {
            return Err(NameError::InvalidCharacters);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfies the strength policy.
///
/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;

    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }

        let has_upper = password.chars().any(char::is_uppercase);
        let has_lower = password.chars().any(char::is_lowercase);
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_upper && has_lower && has_digit) {
            return Err(PasswordPolicyError::MissingCharacterClass);
        }

        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Hours a freshly issued token stays valid. At least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetime(i32);

impl TokenLifetime {
    pub fn new(hours: i32) -> Result<Self, TokenLifetimeError> {
        if hours < 1 {
            return Err(TokenLifetimeError::TooShort(hours));
        }
        Ok(Self(hours))
    }

    pub fn hours(&self) -> i32 {
        self.0
    }
}

/// Command to register a new identity with domain types
#[derive(Debug)]
pub struct CreateIdentityCommand {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub password: Password,
    pub token_lifetime: TokenLifetime,
}

/// Command to replace an identity's profile and grants.
#[derive(Debug)]
pub struct UpdateIdentityCommand {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub active: bool,
    pub token_lifetime: TokenLifetime,
    pub service_grants: Vec<ServiceGrant>,
}

/// Stored credentials for one identity: password hash and encoded keypair.
#[derive(Clone)]
pub struct IdentitySecrets {
    pub password_hash: String,
    pub public_key: String,
    pub private_key: String,
}

/// Identity ready to be persisted, before the store assigns its id.
#[derive(Clone)]
pub struct NewIdentity {
    pub identifier: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub token_lifetime_hours: i32,
    pub secrets: IdentitySecrets,
}
