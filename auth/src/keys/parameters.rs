use std::fmt;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PrivateKeyParts;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use rsa::RsaPrivateKey;

use super::errors::KeyError;

/// Modulus size used for every generated account and service key.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Canonical RSA parameters, big-endian unsigned integers.
///
/// A public key carries only the modulus and public exponent. A private key
/// additionally carries the private exponent and CRT parameters, which is
/// everything needed to rebuild a signing context.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaKeyParameters {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
    pub private: Option<RsaPrivateParameters>,
}

/// Private half of an RSA key.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateParameters {
    pub private_exponent: Vec<u8>,
    pub prime_p: Vec<u8>,
    pub prime_q: Vec<u8>,
    pub exponent_p: Vec<u8>,
    pub exponent_q: Vec<u8>,
    pub coefficient: Vec<u8>,
}

/// A freshly generated keypair, split into its storable halves.
#[derive(Clone)]
pub struct RsaKeyPair {
    pub public: RsaKeyParameters,
    pub private: RsaKeyParameters,
}

impl RsaKeyPair {
    /// Generate a new keypair with [`DEFAULT_KEY_BITS`].
    ///
    /// CPU heavy; async callers should run it on a blocking thread.
    ///
    /// # Errors
    /// * `GenerationFailed` - The RNG or prime search failed
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with_bits(DEFAULT_KEY_BITS)
    }

    /// Generate a new keypair with the given modulus size.
    pub fn generate_with_bits(bits: usize) -> Result<Self, KeyError> {
        let key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
        let private = RsaKeyParameters::from_private_key(&key)?;

        Ok(Self {
            public: private.to_public(),
            private,
        })
    }
}

impl RsaKeyParameters {
    fn from_private_key(key: &RsaPrivateKey) -> Result<Self, KeyError> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(KeyError::InvalidKey(format!(
                "expected 2 primes, got {}",
                primes.len()
            )));
        }

        let missing_crt = || KeyError::InvalidKey("CRT parameters not precomputed".to_string());
        let exponent_p = key.dp().ok_or_else(missing_crt)?;
        let exponent_q = key.dq().ok_or_else(missing_crt)?;
        let coefficient = key.crt_coefficient().ok_or_else(missing_crt)?;

        Ok(Self {
            modulus: key.n().to_bytes_be(),
            public_exponent: key.e().to_bytes_be(),
            private: Some(RsaPrivateParameters {
                private_exponent: key.d().to_bytes_be(),
                prime_p: primes[0].to_bytes_be(),
                prime_q: primes[1].to_bytes_be(),
                exponent_p: exponent_p.to_bytes_be(),
                exponent_q: exponent_q.to_bytes_be(),
                coefficient: coefficient.to_bytes_be(),
            }),
        })
    }

    /// Copy of this key without private parameters.
    pub fn to_public(&self) -> Self {
        Self {
            modulus: self.modulus.clone(),
            public_exponent: self.public_exponent.clone(),
            private: None,
        }
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Build an RS512 signing key.
    ///
    /// # Errors
    /// * `MissingPrivateParameters` - This is a public key
    /// * `InvalidKey` - Parameters do not form a consistent RSA key
    pub fn encoding_key(&self) -> Result<EncodingKey, KeyError> {
        let private = self
            .private
            .as_ref()
            .ok_or(KeyError::MissingPrivateParameters)?;

        let key = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(&self.modulus),
            BigUint::from_bytes_be(&self.public_exponent),
            BigUint::from_bytes_be(&private.private_exponent),
            vec![
                BigUint::from_bytes_be(&private.prime_p),
                BigUint::from_bytes_be(&private.prime_q),
            ],
        )
        .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        let der = key
            .to_pkcs1_der()
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        Ok(EncodingKey::from_rsa_der(der.as_bytes()))
    }

    /// Build an RS512 verification key from the public components.
    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_rsa_raw_components(&self.modulus, &self.public_exponent)
    }
}

impl fmt::Debug for RsaKeyParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyParameters")
            .field("modulus_bits", &(self.modulus.len() * 8))
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for RsaPrivateParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RsaPrivateParameters(<redacted>)")
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
