use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use argon2::password_hash::Output;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::errors::PasswordError;

const SALT_LENGTH: usize = 16;
const DIGEST_LENGTH: usize = 32;
const MEMORY_COST_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const LANES: u32 = 1;
const SEPARATOR: char = '|';

/// Password hashing implementation.
///
/// Derives a digest with Argon2id and stores it as `base64(salt)|base64(digest)`,
/// keeping the salt next to the hash in a single column. The cost parameters are
/// fixed: changing them would break verification of every stored hash.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    pub fn new() -> Self {
        // Constant parameters within the documented Argon2 bounds.
        let params = Params::new(MEMORY_COST_KIB, ITERATIONS, LANES, Some(DIGEST_LENGTH))
            .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// `base64(salt)|base64(digest)`
    ///
    /// # Errors
    /// * `HashingFailed` - Key derivation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);

        let digest = self.derive(password, &salt)?;

        Ok(format!(
            "{}{}{}",
            STANDARD.encode(salt),
            SEPARATOR,
            STANDARD.encode(digest)
        ))
    }

    /// Verify a password against a stored hash.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Value previously produced by [`PasswordHasher::hash`]
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `InvalidHash` - Stored value is not `base64|base64`
    /// * `HashingFailed` - Key derivation failed
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let (salt, expected) = stored_hash
            .split_once(SEPARATOR)
            .ok_or_else(|| PasswordError::InvalidHash("missing separator".to_string()))?;

        let salt = STANDARD
            .decode(salt)
            .map_err(|e| PasswordError::InvalidHash(format!("salt: {}", e)))?;
        let expected = STANDARD
            .decode(expected)
            .map_err(|e| PasswordError::InvalidHash(format!("digest: {}", e)))?;

        let actual = self.derive(password, &salt)?;

        // Output comparison is constant-time.
        let expected = Output::new(&expected)
            .map_err(|e| PasswordError::InvalidHash(format!("digest: {}", e)))?;
        let actual =
            Output::new(&actual).map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(expected == actual)
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<[u8; DIGEST_LENGTH], PasswordError> {
        let mut digest = [0u8; DIGEST_LENGTH];
        self.argon2
            .hash_password_into(password.as_bytes(), salt, &mut digest)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(digest)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
