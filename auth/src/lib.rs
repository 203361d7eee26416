//! Credential primitives for the identity gateway.
//!
//! - RSA key material and its storable text form ([`KeyCodec`])
//! - Salted Argon2id password hashing ([`PasswordHasher`])
//! - RS512 tokens signed with the subject's own key ([`TokenService`])
//! - An injectable time source ([`Clock`])
//!
//! Nothing here touches storage or HTTP; the gateway service supplies keys
//! and decides what a verified token means.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Tokens
//! ```no_run
//! use std::sync::Arc;
//!
//! use auth::{KeyCodec, RsaKeyPair, SystemClock, TokenService};
//!
//! let keys = RsaKeyPair::generate().unwrap();
//! let stored_public = KeyCodec::encode(&keys.public);
//!
//! let tokens = TokenService::new(Arc::new(SystemClock));
//! let token = tokens.issue(&"alice", 8, &keys.private, "gateway").unwrap();
//!
//! let parsed = tokens.parse::<String>(&token).unwrap();
//! let public = KeyCodec::decode(&stored_public).unwrap();
//! assert!(tokens.verify_signature(&parsed, &public));
//! ```

pub mod clock;
pub mod jwt;
pub mod keys;
pub mod password;

pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use jwt::JwtError;
pub use jwt::ParsedToken;
pub use jwt::TokenClaims;
pub use jwt::TokenService;
pub use keys::KeyCodec;
pub use keys::KeyError;
pub use keys::RsaKeyPair;
pub use keys::RsaKeyParameters;
pub use password::PasswordError;
pub use password::PasswordHasher;
