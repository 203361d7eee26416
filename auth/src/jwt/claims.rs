use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Registered claims wrapped around an application payload.
///
/// `iat` and `exp` are Unix timestamps in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims<T> {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub payload: T,
}

impl<T> TokenClaims<T> {
    /// A token is expired from its `exp` second onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn is_issued_by(&self, issuer: &str) -> bool {
        self.iss == issuer
    }
}
