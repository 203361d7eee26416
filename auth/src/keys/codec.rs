use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde::Serialize;

use super::errors::KeyError;
use super::parameters::RsaKeyParameters;
use super::parameters::RsaPrivateParameters;

/// Current version of the stored key schema.
pub const KEY_FORMAT_VERSION: u32 = 1;

/// Transport format for RSA key parameters.
///
/// The encoded form is base64 over a versioned JSON document whose fields are
/// base64url big-endian integers, so it fits in a single text column and inside
/// JSON payloads. No cryptography happens here.
pub struct KeyCodec;

#[derive(Serialize, Deserialize)]
struct EncodedKey {
    version: u32,
    modulus: String,
    public_exponent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_exponent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prime_p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prime_q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exponent_p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exponent_q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coefficient: Option<String>,
}

impl KeyCodec {
    /// Encode key parameters into their printable transport form.
    pub fn encode(key: &RsaKeyParameters) -> String {
        let private = key.private.as_ref();
        let field = |bytes: &Vec<u8>| URL_SAFE_NO_PAD.encode(bytes);

        let encoded = EncodedKey {
            version: KEY_FORMAT_VERSION,
            modulus: field(&key.modulus),
            public_exponent: field(&key.public_exponent),
            private_exponent: private.map(|p| field(&p.private_exponent)),
            prime_p: private.map(|p| field(&p.prime_p)),
            prime_q: private.map(|p| field(&p.prime_q)),
            exponent_p: private.map(|p| field(&p.exponent_p)),
            exponent_q: private.map(|p| field(&p.exponent_q)),
            coefficient: private.map(|p| field(&p.coefficient)),
        };

        // A struct of strings and an integer always serializes.
        let json = serde_json::to_vec(&encoded).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Decode key parameters from their transport form.
    ///
    /// # Errors
    /// * `MalformedKey` - Not base64, not the expected JSON shape, an empty
    ///   parameter, or a partial set of private parameters
    /// * `UnsupportedVersion` - Written by a newer schema
    pub fn decode(encoded: &str) -> Result<RsaKeyParameters, KeyError> {
        let json = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyError::MalformedKey(format!("invalid base64: {}", e)))?;

        let key: EncodedKey = serde_json::from_slice(&json)
            .map_err(|e| KeyError::MalformedKey(format!("invalid key document: {}", e)))?;

        if key.version != KEY_FORMAT_VERSION {
            return Err(KeyError::UnsupportedVersion(key.version));
        }

        let private = match (
            key.private_exponent,
            key.prime_p,
            key.prime_q,
            key.exponent_p,
            key.exponent_q,
            key.coefficient,
        ) {
            (None, None, None, None, None, None) => None,
            (Some(d), Some(p), Some(q), Some(dp), Some(dq), Some(qi)) => {
                Some(RsaPrivateParameters {
                    private_exponent: decode_integer("private_exponent", &d)?,
                    prime_p: decode_integer("prime_p", &p)?,
                    prime_q: decode_integer("prime_q", &q)?,
                    exponent_p: decode_integer("exponent_p", &dp)?,
                    exponent_q: decode_integer("exponent_q", &dq)?,
                    coefficient: decode_integer("coefficient", &qi)?,
                })
            }
            _ => {
                return Err(KeyError::MalformedKey(
                    "incomplete private parameters".to_string(),
                ))
            }
        };

        Ok(RsaKeyParameters {
            modulus: decode_integer("modulus", &key.modulus)?,
            public_exponent: decode_integer("public_exponent", &key.public_exponent)?,
            private,
        })
    }
}

fn decode_integer(name: &str, value: &str) -> Result<Vec<u8>, KeyError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| KeyError::MalformedKey(format!("{}: {}", name, e)))?;

    if bytes.is_empty() {
        return Err(KeyError::MalformedKey(format!("{}: empty", name)));
    }

    Ok(bytes)
}
