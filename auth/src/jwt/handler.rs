use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use jsonwebtoken::crypto;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Header;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::claims::TokenClaims;
use super::errors::JwtError;
use crate::clock::Clock;
use crate::keys::RsaKeyParameters;

const ALGORITHM: Algorithm = Algorithm::RS512;

/// A structurally valid token whose signature has not been checked yet.
///
/// Nothing read from `claims` should be trusted until
/// [`TokenService::verify_signature`] succeeds against a key obtained
/// independently of the token.
#[derive(Debug, Clone)]
pub struct ParsedToken<T> {
    pub header: Header,
    pub claims: TokenClaims<T>,
    signing_input: String,
    signature: String,
}

/// RS512 token issuance and verification.
///
/// Tokens are signed with the subject's own private key, so verification needs
/// the subject's public key. Parsing and signature checking are separate steps:
/// the caller reads the unverified payload to learn whose key to fetch.
pub struct TokenService {
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Issue a signed token carrying `payload`.
    ///
    /// # Arguments
    /// * `payload` - Application payload embedded under the `payload` claim
    /// * `lifetime_hours` - Hours from now until the token expires
    /// * `private_key` - Subject's private key
    /// * `issuer` - Value of the `iss` claim
    ///
    /// # Returns
    /// Compact `header.payload.signature` token
    ///
    /// # Errors
    /// * `InvalidKey` - Key has no private parameters or is inconsistent
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn issue<T: Serialize>(
        &self,
        payload: &T,
        lifetime_hours: i64,
        private_key: &RsaKeyParameters,
        issuer: &str,
    ) -> Result<String, JwtError> {
        let now = self.clock.now();
        let claims = TokenClaims {
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(lifetime_hours)).timestamp(),
            payload,
        };

        let key = private_key.encoding_key()?;

        encode(&Header::new(ALGORITHM), &claims, &key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode a token without checking its signature.
    ///
    /// # Errors
    /// * `MalformedToken` - Not three base64url segments, an algorithm other
    ///   than RS512, or claims of the wrong shape
    pub fn parse<T: DeserializeOwned>(&self, token: &str) -> Result<ParsedToken<T>, JwtError> {
        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| JwtError::MalformedToken("expected three segments".to_string()))?;

        let (_, payload) = signing_input
            .split_once('.')
            .ok_or_else(|| JwtError::MalformedToken("expected three segments".to_string()))?;

        if payload.contains('.') || signature.is_empty() {
            return Err(JwtError::MalformedToken(
                "expected three segments".to_string(),
            ));
        }

        let header = decode_header(token)
            .map_err(|e| JwtError::MalformedToken(format!("header: {}", e)))?;

        if header.alg != ALGORITHM {
            return Err(JwtError::MalformedToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| JwtError::MalformedToken(format!("payload: {}", e)))?;

        let claims: TokenClaims<T> = serde_json::from_slice(&payload)
            .map_err(|e| JwtError::MalformedToken(format!("claims: {}", e)))?;

        Ok(ParsedToken {
            header,
            claims,
            signing_input: signing_input.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Check the token's RS512 signature over its original signing input.
    ///
    /// Returns false for a mismatched signature as well as for key material
    /// that cannot be used for verification.
    pub fn verify_signature<T>(
        &self,
        token: &ParsedToken<T>,
        public_key: &RsaKeyParameters,
    ) -> bool {
        crypto::verify(
            &token.signature,
            token.signing_input.as_bytes(),
            &public_key.decoding_key(),
            ALGORITHM,
        )
        .unwrap_or(false)
    }
}
